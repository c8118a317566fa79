//!Declarative port map over the Raspberry Pi GPIO pins. It is a wrapper
//!around the rppal library.
//!
//!`build_port_map` turns a table of `PortDescriptor`s into live accessors,
//!configuring each pin exactly once. The `bus` module provides the I2C
//!transport used by register-backed devices.

use std::collections::HashMap;

use portio_core::error::PortBuildError;
use portio_core::{Port, PortMap};
use rppal::gpio::Gpio;
use tracing::debug;

pub use rppal;

pub mod bus;
pub mod descriptor;
pub mod error;
pub mod ports;

use descriptor::{DigitalMode, PortDescriptor};
use error::GpioPortError;
use ports::digital::{DigitalInPort, DigitalOutPort, OpenDrainPort};
use ports::pwm::{clock_divider, PwmPort};
use ports::servo::{ServoPort, ServoScale};

///Configure every pin in `descriptors` exactly once and return the resulting
///port map. All descriptors are validated up front: an invalid one fails the
///whole build before any pin is touched, with every problem reported at once.
pub fn build_port_map(
    descriptors: HashMap<String, PortDescriptor>,
) -> Result<PortMap, PortBuildError> {
    let mut errs = Vec::new();
    for (label, descriptor) in &descriptors {
        if let Err(err) = validate(descriptor) {
            errs.push(PortBuildError::from_string(format!(
                "port {}: {}",
                label, err.message
            )));
        }
    }
    if !errs.is_empty() {
        return Err(PortBuildError::from_errs(errs));
    }

    let gpio = Gpio::new()
        .map_err(|err| PortBuildError::from_string(format!("error creating gpio: {}", err)))?;

    let mut ports = HashMap::with_capacity(descriptors.len());
    for (label, descriptor) in descriptors {
        let port = build_port(&gpio, descriptor).map_err(|err| {
            PortBuildError::from_string(format!("port {}: {}", label, err.message))
        })?;
        debug!("configured port {}", label);
        ports.insert(label, port);
    }
    Ok(PortMap::new(ports))
}

//configuration problems detectable without hardware
fn validate(descriptor: &PortDescriptor) -> Result<(), GpioPortError> {
    match descriptor {
        PortDescriptor::Digital { config, callback } => {
            if callback.is_some() && !config.mode.is_input() {
                return Err(GpioPortError::from(format!(
                    "edge callback requires an input mode, pin {} is {:?}",
                    config.pin, config.mode
                )));
            }
            Ok(())
        }
        PortDescriptor::Servo(config) => ServoScale::from_config(config).map(|_| ()),
        PortDescriptor::Pwm(config) => clock_divider(config.hz).map(|_| ()),
        PortDescriptor::Custom(_) => Ok(()),
    }
}

fn build_port(gpio: &Gpio, descriptor: PortDescriptor) -> Result<Port, GpioPortError> {
    match descriptor {
        PortDescriptor::Digital { config, callback } => match config.mode {
            DigitalMode::Output => DigitalOutPort::try_build(gpio, &config).map(Port::bool),
            DigitalMode::OutputOpenDrain => OpenDrainPort::try_build(gpio, &config).map(Port::bool),
            DigitalMode::Input | DigitalMode::InputPullup => {
                DigitalInPort::try_build(gpio, &config, callback).map(Port::bool)
            }
        },
        PortDescriptor::Servo(config) => ServoPort::try_build(gpio, &config).map(Port::float),
        PortDescriptor::Pwm(config) => PwmPort::try_build(gpio, &config).map(Port::float),
        PortDescriptor::Custom(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DigitalConfig, PwmConfig};

    #[test]
    fn invalid_descriptors_fail_before_any_pin_is_touched() {
        let descriptors = HashMap::from([
            (
                "backlight".to_owned(),
                PortDescriptor::Pwm(PwmConfig {
                    pin: 18,
                    default: 0.0,
                    max: 1.0,
                    hz: 44_100.0,
                }),
            ),
            (
                "led".to_owned(),
                PortDescriptor::digital_with_callback(
                    DigitalConfig {
                        pin: 5,
                        mode: DigitalMode::Output,
                        default: false,
                        edge: None,
                    },
                    Box::new(|_| {}),
                ),
            ),
        ]);

        //both problems are reported in one failure, without a gpio handle
        match build_port_map(descriptors) {
            Err(PortBuildError::Messages(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected a multi-message failure, got {:?}", other),
        }
    }
}
