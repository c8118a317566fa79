use std::collections::HashMap;

use portio_core::error::PortBuildError;
use portio_core::PortMap;
use portio_rpi_gpio::build_port_map;
use portio_rpi_gpio::descriptor::{PortConfig, PortDescriptor};
use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct Metadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

///Top level config file shape: optional metadata plus the port table.
#[derive(Deserialize, Debug)]
pub struct PortFileConfig {
    #[serde(default)]
    pub metadata: Metadata,
    pub ports: HashMap<String, PortConfig>,
}

impl PortFileConfig {
    pub fn build(self) -> Result<PortMap, PortBuildError> {
        let descriptors = self
            .ports
            .into_iter()
            .map(|(label, config)| (label, PortDescriptor::from(config)))
            .collect();
        build_port_map(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_port_table_with_metadata() {
        let yaml = r#"
metadata:
  name: panel
  description: front panel wiring
ports:
  led:
    type: digital
    pin: 5
    default: true
  dimmer:
    type: pwm
    pin: 18
    hz: 300000.0
"#;
        let config = config_rs::Config::builder()
            .add_source(config_rs::File::from_str(yaml, config_rs::FileFormat::Yaml))
            .build()
            .unwrap();
        let parsed: PortFileConfig = config.try_deserialize().unwrap();

        assert_eq!(parsed.metadata.name.as_deref(), Some("panel"));
        assert_eq!(parsed.ports.len(), 2);
    }

    #[test]
    fn metadata_is_optional() {
        let yaml = r#"
ports:
  button:
    type: digital
    pin: 21
    mode: inputpullup
"#;
        let config = config_rs::Config::builder()
            .add_source(config_rs::File::from_str(yaml, config_rs::FileFormat::Yaml))
            .build()
            .unwrap();
        let parsed: PortFileConfig = config.try_deserialize().unwrap();
        assert!(parsed.metadata.name.is_none());
    }
}
