//!Declarative port descriptors.
//!
//!`PortConfig` is the serde-facing table entry for the file-configurable
//!kinds; `PortDescriptor` is the resolved sum type consumed by
//!`build_port_map`, adding edge callbacks and custom accessors that can only
//!be built in code. Unknown type tags are a parse error, not a silently
//!skipped port.

use std::fmt;

use portio_core::Port;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigitalMode {
    #[default]
    Output,
    Input,
    InputPullup,
    OutputOpenDrain,
}

impl DigitalMode {
    pub fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::InputPullup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTrigger {
    Rising,
    Falling,
    Both,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigitalConfig {
    pub pin: u8,
    #[serde(default)]
    pub mode: DigitalMode,
    ///Initial logical value driven at setup (outputs only).
    #[serde(default)]
    pub default: bool,
    ///Which edges fire the callback, if one is installed. Defaults to both.
    pub edge: Option<EdgeTrigger>,
}

///One bound of a servo's travel: a bare pulse width in microseconds, or an
///{angle, pulse} anchor when the angle range is not the stock 0-180.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ServoBound {
    Pulse(f64),
    Anchor { angle: f64, pulse: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServoConfig {
    pub pin: u8,
    ///Initial angle committed at setup.
    #[serde(default)]
    pub default: f64,
    pub min: Option<ServoBound>,
    pub max: Option<ServoBound>,
    ///Angular offset applied before scaling.
    #[serde(default)]
    pub offset: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PwmConfig {
    pub pin: u8,
    ///Initial value committed at setup.
    #[serde(default)]
    pub default: f64,
    ///Normalization ceiling: values are divided by this when it exceeds 1.
    #[serde(default = "default_pwm_max")]
    pub max: f64,
    ///Tick clock in hertz; must divide the 19.2 MHz reference by a power of
    ///two.
    #[serde(default = "default_pwm_hz")]
    pub hz: f64,
}

fn default_pwm_max() -> f64 {
    1.0
}

fn default_pwm_hz() -> f64 {
    300_000.0
}

///File-configurable port kinds, dispatched on their lowercase `type` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PortConfig {
    Digital(DigitalConfig),
    Servo(ServoConfig),
    Pwm(PwmConfig),
}

///Edge-event handler for a digital input. Receives the logical pin level
///(already inverted for pull-up inputs).
pub type EdgeCallback = Box<dyn FnMut(bool) + Send + 'static>;

///A fully resolved port descriptor, consumed once at dispatcher construction.
pub enum PortDescriptor {
    Digital {
        config: DigitalConfig,
        callback: Option<EdgeCallback>,
    },
    Servo(ServoConfig),
    Pwm(PwmConfig),
    ///A caller-supplied accessor installed verbatim, with no pin
    ///configuration performed.
    Custom(Port),
}

impl PortDescriptor {
    pub fn digital(config: DigitalConfig) -> Self {
        Self::Digital {
            config,
            callback: None,
        }
    }

    pub fn digital_with_callback(config: DigitalConfig, callback: EdgeCallback) -> Self {
        Self::Digital {
            config,
            callback: Some(callback),
        }
    }
}

impl From<PortConfig> for PortDescriptor {
    fn from(config: PortConfig) -> Self {
        match config {
            PortConfig::Digital(config) => PortDescriptor::digital(config),
            PortConfig::Servo(config) => PortDescriptor::Servo(config),
            PortConfig::Pwm(config) => PortDescriptor::Pwm(config),
        }
    }
}

impl fmt::Debug for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital { config, callback } => f
                .debug_struct("Digital")
                .field("config", config)
                .field("callback", &callback.is_some())
                .finish(),
            Self::Servo(config) => f.debug_tuple("Servo").field(config).finish(),
            Self::Pwm(config) => f.debug_tuple("Pwm").field(config).finish(),
            Self::Custom(port) => f.debug_tuple("Custom").field(port).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_a_port_table() {
        let table: HashMap<String, PortConfig> = serde_json::from_str(
            r#"{
                "power_led": { "type": "digital", "pin": 5, "default": true },
                "button": { "type": "digital", "pin": 21, "mode": "inputpullup", "edge": "falling" },
                "motor": { "type": "servo", "pin": 12, "offset": -4.0 },
                "backlight": { "type": "pwm", "pin": 18, "hz": 300000.0, "max": 255.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(table.len(), 4);

        match &table["power_led"] {
            PortConfig::Digital(config) => {
                assert_eq!(config.pin, 5);
                assert_eq!(config.mode, DigitalMode::Output);
                assert!(config.default);
            }
            other => panic!("expected digital, got {:?}", other),
        }

        match &table["button"] {
            PortConfig::Digital(config) => {
                assert_eq!(config.mode, DigitalMode::InputPullup);
                assert_eq!(config.edge, Some(EdgeTrigger::Falling));
            }
            other => panic!("expected digital, got {:?}", other),
        }

        match &table["backlight"] {
            PortConfig::Pwm(config) => {
                assert_eq!(config.max, 255.0);
                assert_eq!(config.default, 0.0);
            }
            other => panic!("expected pwm, got {:?}", other),
        }
    }

    #[test]
    fn servo_bounds_accept_pulses_and_anchors() {
        let config: PortConfig = serde_json::from_str(
            r#"{ "type": "servo", "pin": 12, "min": 600.0, "max": { "angle": 90.0, "pulse": 1500.0 } }"#,
        )
        .unwrap();

        match config {
            PortConfig::Servo(config) => {
                assert!(matches!(config.min, Some(ServoBound::Pulse(p)) if p == 600.0));
                assert!(
                    matches!(config.max, Some(ServoBound::Anchor { angle, pulse }) if angle == 90.0 && pulse == 1500.0)
                );
            }
            other => panic!("expected servo, got {:?}", other),
        }
    }

    #[test]
    fn unknown_type_tags_are_rejected() {
        let result: Result<PortConfig, _> =
            serde_json::from_str(r#"{ "type": "analog", "pin": 7 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn open_drain_mode_parses() {
        let config: DigitalConfig =
            serde_json::from_str(r#"{ "pin": 4, "mode": "outputopendrain" }"#).unwrap();
        assert_eq!(config.mode, DigitalMode::OutputOpenDrain);
    }
}
