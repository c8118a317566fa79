//!General duty-cycle output.
//!
//!The tick clock is the 19.2 MHz reference divided by a power-of-two divider;
//!duty is committed against a fixed 1023-tick range, so the carrier runs at
//!tick rate / 1023.

use portio_core::error::PortError;
use portio_core::PortAccessor;
use rppal::gpio::{Gpio, OutputPin};
use tracing::debug;

use crate::descriptor::PwmConfig;
use crate::error::GpioPortError;

pub const REFERENCE_CLOCK_HZ: f64 = 19_200_000.0;
pub const DUTY_RANGE_TICKS: f64 = 1_023.0;
const MAX_DIVIDER: u32 = 4096;

///Clock divider for a requested tick rate. Only rates that divide the
///reference clock by a power of two up to 4096 are achievable; anything else
///is an invalid configuration, reported before the pin is touched.
pub fn clock_divider(hz: f64) -> Result<u32, GpioPortError> {
    if hz > 0.0 {
        let divider = REFERENCE_CLOCK_HZ / hz;
        if divider.fract() == 0.0 {
            let divider = divider as u32;
            if divider.is_power_of_two() && divider <= MAX_DIVIDER {
                return Ok(divider);
            }
        }
    }
    Err(GpioPortError::from(format!(
        "unsupported pwm tick rate {} Hz, must be 19.2 MHz over a power of two up to 4096",
        hz
    )))
}

///Duty ticks for a commanded value; `max` above 1 turns the value into a
///fraction of `max` first.
pub fn duty_ticks(value: f64, max: f64) -> u16 {
    let normalized = if max > 1.0 { value / max } else { value };
    (normalized * DUTY_RANGE_TICKS).round() as u16
}

///Duty-cycle output. `get` returns the last commanded value in the same
///units `set` accepts.
pub struct PwmPort {
    pin: OutputPin,
    max: f64,
    hz: f64,
    value: f64,
}

impl PwmPort {
    pub fn try_build(gpio: &Gpio, cfg: &PwmConfig) -> Result<Self, GpioPortError> {
        let divider = clock_divider(cfg.hz)?;
        let pin = gpio.get(cfg.pin)?.into_output_low();

        let mut port = Self {
            pin,
            max: cfg.max,
            hz: cfg.hz,
            value: 0.0,
        };
        port.command(cfg.default)?;
        debug!(
            "configured pwm on pin {} ({} Hz ticks, divider {})",
            cfg.pin, cfg.hz, divider
        );
        Ok(port)
    }

    fn command(&mut self, value: f64) -> Result<(), GpioPortError> {
        self.value = value;
        let ticks = duty_ticks(value, self.max);
        self.pin
            .set_pwm_frequency(self.hz / DUTY_RANGE_TICKS, f64::from(ticks) / DUTY_RANGE_TICKS)
            .map_err(GpioPortError::from)
    }
}

impl PortAccessor<f64> for PwmPort {
    fn get(&mut self) -> Result<f64, PortError> {
        Ok(self.value)
    }

    fn set(&mut self, value: f64) -> Result<(), PortError> {
        self.command(value).map_err(|err| PortError::io(err.message))
    }
}
