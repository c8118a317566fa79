use std::fmt::{Debug, Formatter};

use portio_core::error::PortBuildError;

pub struct GpioPortError {
    pub message: String,
}

impl Debug for GpioPortError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt.write_str(&self.message)
    }
}

impl From<&str> for GpioPortError {
    fn from(s: &str) -> Self {
        Self {
            message: s.to_string(),
        }
    }
}

impl From<String> for GpioPortError {
    fn from(s: String) -> Self {
        Self { message: s }
    }
}

impl From<rppal::gpio::Error> for GpioPortError {
    fn from(err: rppal::gpio::Error) -> Self {
        Self {
            message: format!("GpioPortError - Cause: {}", err),
        }
    }
}

impl From<GpioPortError> for PortBuildError {
    fn from(err: GpioPortError) -> Self {
        PortBuildError::from_string(err.message)
    }
}
