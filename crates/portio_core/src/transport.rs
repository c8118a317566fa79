//!The bus transport contract required by the register helper.

use std::fmt::{Debug, Formatter};

use crate::error::PortError;

///Error from a raw bus transfer.
pub struct TransportError {
    pub message: String,
}

impl Debug for TransportError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt.write_str(&self.message)
    }
}

impl From<&str> for TransportError {
    fn from(s: &str) -> Self {
        Self {
            message: s.to_string(),
        }
    }
}

impl From<String> for TransportError {
    fn from(s: String) -> Self {
        Self { message: s }
    }
}

impl From<TransportError> for PortError {
    fn from(err: TransportError) -> Self {
        PortError::io(err.message)
    }
}

///A byte-oriented, addressed bus shared by every peripheral on it.
///
///The bus is address-less between calls: callers must re-target it with
///`select` (and `set_rate`) immediately before each transfer, since another
///device handle may have used the bus in between. Setup and teardown of the
///underlying bus map to construction and `Drop` of the implementation.
pub trait Transport: Send {
    ///Target the following transfers at the device with the given 7-bit address.
    fn select(&mut self, address: u8) -> Result<(), TransportError>;

    ///Request a transfer rate in hertz for the following transfers.
    fn set_rate(&mut self, hz: u32) -> Result<(), TransportError>;

    ///Write all of `data` to the selected device in one transfer.
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    ///Fill `data` from the selected device in one transfer.
    fn read(&mut self, data: &mut [u8]) -> Result<(), TransportError>;
}
