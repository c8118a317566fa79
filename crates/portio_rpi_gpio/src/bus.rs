//!rppal-backed transport for the shared I2C bus.

use portio_core::transport::{Transport, TransportError};
use rppal::i2c::I2c;
use tracing::debug;

///Get an i2c bus transport by bus id.
pub fn get_bus(bus: u8) -> Result<I2cTransport, TransportError> {
    let i2c = I2c::with_bus(bus)
        .map_err(|err| TransportError::from(format!("error opening i2c bus {}: {}", bus, err)))?;
    Ok(I2cTransport::new(i2c))
}

///Get the default i2c bus transport.
pub fn get_default_bus() -> Result<I2cTransport, TransportError> {
    let i2c =
        I2c::new().map_err(|err| TransportError::from(format!("error opening i2c bus: {}", err)))?;
    Ok(I2cTransport::new(i2c))
}

///The kernel I2C device behind the four-primitive transport contract.
///
///The bus clock is fixed by the kernel at boot, so `set_rate` only records
///the request; a mismatch shows up in the logs rather than on the wire.
pub struct I2cTransport {
    i2c: I2c,
    rate_hz: u32,
}

impl I2cTransport {
    pub fn new(i2c: I2c) -> Self {
        Self { i2c, rate_hz: 0 }
    }
}

impl Transport for I2cTransport {
    fn select(&mut self, address: u8) -> Result<(), TransportError> {
        self.i2c.set_slave_address(address as u16).map_err(|err| {
            TransportError::from(format!("error selecting device {:#04x}: {}", address, err))
        })
    }

    fn set_rate(&mut self, hz: u32) -> Result<(), TransportError> {
        if self.rate_hz != hz {
            debug!("bus clock is kernel-managed; transfer rate {} Hz requested", hz);
            self.rate_hz = hz;
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let written = self
            .i2c
            .write(data)
            .map_err(|err| TransportError::from(format!("i2c write failed: {}", err)))?;
        if written != data.len() {
            return Err(TransportError::from(format!(
                "short i2c write: {} of {} bytes",
                written,
                data.len()
            )));
        }
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<(), TransportError> {
        let read = self
            .i2c
            .read(data)
            .map_err(|err| TransportError::from(format!("i2c read failed: {}", err)))?;
        if read != data.len() {
            return Err(TransportError::from(format!(
                "short i2c read: {} of {} bytes",
                read,
                data.len()
            )));
        }
        Ok(())
    }
}
