//!Drivers for I2C peripherals, built on the register helper in `portio_core`.

pub mod devices;
pub mod error;
