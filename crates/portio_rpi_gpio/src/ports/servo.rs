//!Servo pulse-width port.
//!
//!Pulses ride a fixed 50 Hz carrier: the 19.2 MHz reference divided by 128
//!gives a 150 kHz tick clock, and a 3000-tick duty range makes a 20 ms period
//!at 20000/3000 us per tick.

use std::time::Duration;

use portio_core::error::PortError;
use portio_core::PortAccessor;
use rppal::gpio::{Gpio, OutputPin};
use tracing::debug;

use crate::descriptor::{ServoBound, ServoConfig};
use crate::error::GpioPortError;

pub const CARRIER_PERIOD_US: f64 = 20_000.0;
pub const DUTY_RANGE_TICKS: f64 = 3_000.0;
///Microseconds per duty tick.
pub const TICK_US: f64 = CARRIER_PERIOD_US / DUTY_RANGE_TICKS;

const DEFAULT_MIN_PULSE_US: f64 = 500.0;
const DEFAULT_MAX_PULSE_US: f64 = 2_400.0;
const DEFAULT_MIN_ANGLE: f64 = 0.0;
const DEFAULT_MAX_ANGLE: f64 = 180.0;

///Linear angle-to-pulse mapping resolved from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoScale {
    pub min_angle: f64,
    pub min_pulse_us: f64,
    pub offset: f64,
    ///Microseconds of pulse per degree.
    pub scale: f64,
}

impl ServoScale {
    pub fn from_config(cfg: &ServoConfig) -> Result<Self, GpioPortError> {
        let (min_angle, min_pulse) = resolve_bound(cfg.min, DEFAULT_MIN_ANGLE, DEFAULT_MIN_PULSE_US);
        let (max_angle, max_pulse) = resolve_bound(cfg.max, DEFAULT_MAX_ANGLE, DEFAULT_MAX_PULSE_US);
        if max_angle <= min_angle {
            return Err(GpioPortError::from(format!(
                "servo angle bounds must satisfy min < max, got {}..{}",
                min_angle, max_angle
            )));
        }
        Ok(Self {
            min_angle,
            min_pulse_us: min_pulse,
            offset: cfg.offset,
            scale: (max_pulse - min_pulse) / (max_angle - min_angle),
        })
    }

    pub fn pulse_us(&self, angle: f64) -> f64 {
        (angle - self.min_angle + self.offset) * self.scale + self.min_pulse_us
    }

    ///Commanded angle as a whole number of duty ticks (truncated).
    pub fn duty_ticks(&self, angle: f64) -> u16 {
        (self.pulse_us(angle) / TICK_US) as u16
    }
}

fn resolve_bound(bound: Option<ServoBound>, default_angle: f64, default_pulse: f64) -> (f64, f64) {
    match bound {
        None => (default_angle, default_pulse),
        Some(ServoBound::Pulse(pulse)) => (default_angle, pulse),
        Some(ServoBound::Anchor { angle, pulse }) => (angle, pulse),
    }
}

///Angle-commanded servo output. The hardware is write-only, so `get` returns
///the last commanded angle. Commanded angles are not clamped; staying inside
///the travel bounds is the caller's responsibility.
pub struct ServoPort {
    pin: OutputPin,
    scale: ServoScale,
    value: f64,
}

impl ServoPort {
    pub fn try_build(gpio: &Gpio, cfg: &ServoConfig) -> Result<Self, GpioPortError> {
        let scale = ServoScale::from_config(cfg)?;
        let pin = gpio.get(cfg.pin)?.into_output_low();

        let mut port = Self {
            pin,
            scale,
            value: 0.0,
        };
        //the default angle is committed immediately at configuration time
        port.command(cfg.default)?;
        debug!("configured servo on pin {} ({:?})", cfg.pin, port.scale);
        Ok(port)
    }

    fn command(&mut self, angle: f64) -> Result<(), GpioPortError> {
        self.value = angle;
        let pulse_us = f64::from(self.scale.duty_ticks(angle)) * TICK_US;
        self.pin
            .set_pwm(
                Duration::from_secs_f64(CARRIER_PERIOD_US / 1e6),
                Duration::from_secs_f64(pulse_us / 1e6),
            )
            .map_err(GpioPortError::from)
    }
}

impl PortAccessor<f64> for ServoPort {
    fn get(&mut self) -> Result<f64, PortError> {
        Ok(self.value)
    }

    fn set(&mut self, value: f64) -> Result<(), PortError> {
        self.command(value).map_err(|err| PortError::io(err.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pin: u8) -> ServoConfig {
        ServoConfig {
            pin,
            default: 0.0,
            min: None,
            max: None,
            offset: 0.0,
        }
    }

    #[test]
    fn stock_bounds_map_ninety_degrees_to_midrange() {
        let scale = ServoScale::from_config(&config(12)).unwrap();
        //(90 * (2400 - 500) / 180) + 500
        assert_eq!(scale.pulse_us(90.0), 1450.0);
        //1450 us over 20000/3000 us ticks, truncated
        assert_eq!(scale.duty_ticks(90.0), 217);

        assert_eq!(scale.pulse_us(0.0), 500.0);
        assert_eq!(scale.pulse_us(180.0), 2400.0);
    }

    #[test]
    fn offset_shifts_the_commanded_angle() {
        let mut cfg = config(12);
        cfg.offset = -4.0;
        let scale = ServoScale::from_config(&cfg).unwrap();
        assert_eq!(scale.pulse_us(4.0), 500.0);
    }

    #[test]
    fn anchor_bounds_set_both_angle_and_pulse() {
        let mut cfg = config(12);
        cfg.min = Some(ServoBound::Anchor {
            angle: -90.0,
            pulse: 1000.0,
        });
        cfg.max = Some(ServoBound::Anchor {
            angle: 90.0,
            pulse: 2000.0,
        });
        let scale = ServoScale::from_config(&cfg).unwrap();
        assert_eq!(scale.pulse_us(-90.0), 1000.0);
        assert_eq!(scale.pulse_us(0.0), 1500.0);
        assert_eq!(scale.pulse_us(90.0), 2000.0);
    }

    #[test]
    fn pulse_bounds_keep_the_stock_angle_range() {
        let mut cfg = config(12);
        cfg.min = Some(ServoBound::Pulse(600.0));
        cfg.max = Some(ServoBound::Pulse(2200.0));
        let scale = ServoScale::from_config(&cfg).unwrap();
        assert_eq!(scale.pulse_us(0.0), 600.0);
        assert_eq!(scale.pulse_us(180.0), 2200.0);
    }

    #[test]
    fn degenerate_angle_spans_are_rejected() {
        let mut cfg = config(12);
        cfg.min = Some(ServoBound::Anchor {
            angle: 90.0,
            pulse: 500.0,
        });
        cfg.max = Some(ServoBound::Anchor {
            angle: 90.0,
            pulse: 2400.0,
        });
        assert!(ServoScale::from_config(&cfg).is_err());
    }
}
