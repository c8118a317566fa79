//!Digital pin ports.

use portio_core::error::PortError;
use portio_core::PortAccessor;
use rppal::gpio::{Gpio, InputPin, IoPin, Level, Mode, OutputPin, Trigger};
use tracing::debug;

use crate::descriptor::{DigitalConfig, DigitalMode, EdgeCallback, EdgeTrigger};
use crate::error::GpioPortError;

///Driven digital output. `get` returns the last written logical value; the
///pin level is never read back.
pub struct DigitalOutPort {
    pin: OutputPin,
    value: bool,
}

impl DigitalOutPort {
    pub fn try_build(gpio: &Gpio, cfg: &DigitalConfig) -> Result<Self, GpioPortError> {
        let pin = gpio.get(cfg.pin)?;

        //apply the initial level atomically with the mode switch
        let pin = if cfg.default {
            pin.into_output_high()
        } else {
            pin.into_output_low()
        };
        debug!("configured digital out on pin {} (default {})", cfg.pin, cfg.default);

        Ok(Self {
            pin,
            value: cfg.default,
        })
    }
}

impl PortAccessor<bool> for DigitalOutPort {
    fn get(&mut self) -> Result<bool, PortError> {
        Ok(self.value)
    }

    fn set(&mut self, value: bool) -> Result<(), PortError> {
        self.value = value;
        if value {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

///Software open-drain emulation: `true` sinks the line by driving the pin low,
///`false` releases it back to input. The commanded value is cached; the line
///is never read.
pub struct OpenDrainPort {
    pin: IoPin,
    value: bool,
}

impl OpenDrainPort {
    pub fn try_build(gpio: &Gpio, cfg: &DigitalConfig) -> Result<Self, GpioPortError> {
        let pin = gpio.get(cfg.pin)?;
        let mut pin = pin.into_io(Mode::Input);
        pin.set_low();

        let mut port = Self {
            pin,
            value: cfg.default,
        };
        if cfg.default {
            port.drive(true);
        }
        debug!("configured open drain out on pin {}", cfg.pin);
        Ok(port)
    }

    fn drive(&mut self, value: bool) {
        if value {
            self.pin.set_mode(Mode::Output);
            self.pin.set_low();
        } else {
            self.pin.set_mode(Mode::Input);
        }
    }
}

impl PortAccessor<bool> for OpenDrainPort {
    fn get(&mut self) -> Result<bool, PortError> {
        Ok(self.value)
    }

    fn set(&mut self, value: bool) -> Result<(), PortError> {
        self.value = value;
        self.drive(value);
        Ok(())
    }
}

///Digital input, optionally with the internal pull-up. Pull-up wiring reads
///electrically low when active, so the level is inverted in that mode.
pub struct DigitalInPort {
    pin: InputPin,
    invert: bool,
}

impl DigitalInPort {
    pub fn try_build(
        gpio: &Gpio,
        cfg: &DigitalConfig,
        callback: Option<EdgeCallback>,
    ) -> Result<Self, GpioPortError> {
        let pin = gpio.get(cfg.pin)?;

        let pull_up = cfg.mode == DigitalMode::InputPullup;
        let mut pin = if pull_up {
            pin.into_input_pullup()
        } else {
            pin.into_input()
        };

        //the watcher is only installed here; invocation happens on rppal's
        //interrupt thread
        if let Some(mut callback) = callback {
            let trigger = match cfg.edge {
                Some(EdgeTrigger::Rising) => Trigger::RisingEdge,
                Some(EdgeTrigger::Falling) => Trigger::FallingEdge,
                Some(EdgeTrigger::Both) | None => Trigger::Both,
            };
            pin.set_async_interrupt(trigger, move |level| {
                let value = level == Level::High;
                callback(if pull_up { !value } else { value });
            })?;
            debug!("installed edge watcher on pin {} ({:?})", cfg.pin, cfg.edge);
        }

        debug!("configured digital in on pin {} (pull_up {})", cfg.pin, pull_up);
        Ok(Self {
            pin,
            invert: pull_up,
        })
    }
}

impl PortAccessor<bool> for DigitalInPort {
    fn get(&mut self) -> Result<bool, PortError> {
        let value = self.pin.read() == Level::High;
        Ok(if self.invert { !value } else { value })
    }

    fn set(&mut self, _value: bool) -> Result<(), PortError> {
        Err(PortError::config("digital input ports are read-only"))
    }
}
