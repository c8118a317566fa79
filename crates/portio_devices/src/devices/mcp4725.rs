//!MCP4725 twelve-bit DAC.
//!
//!The DAC has no register map to speak of: reads stream a status frame from
//!the current pointer and writes use the command byte format, so this driver
//!talks to the transport directly instead of going through the register
//!helper.

use std::sync::{Arc, Mutex};

use portio_core::error::PortError;
use portio_core::register::lock_bus;
use portio_core::transport::Transport;
use portio_core::{Port, PortAccessor};
use serde::Deserialize;
use tracing::debug;

use crate::error::DeviceConfigError;

///Write-DAC command, leaving the EEPROM untouched.
const WRITE_DAC_COMMAND: u8 = 0x60;
const DAC_MAX: f64 = 4095.0;
const TRANSFER_RATE_HZ: u32 = 100_000;
///Status frame: settings byte, two DAC data bytes, three EEPROM bytes.
const READBACK_BYTES: usize = 6;

#[derive(Deserialize, Debug)]
pub struct Mcp4725DeviceConfig {
    pub address: u8,
}

impl Default for Mcp4725DeviceConfig {
    fn default() -> Self {
        Self { address: 0x60 }
    }
}

///Analog output port scaled to 0.0..=1.0 of the supply rail. `get` reads the
///value back from the DAC's status frame rather than caching it.
pub struct Mcp4725Port<T: Transport> {
    bus: Arc<Mutex<T>>,
    address: u8,
}

impl<T: Transport + 'static> Mcp4725Port<T> {
    pub fn try_build(
        cfg: &Mcp4725DeviceConfig,
        bus: Arc<Mutex<T>>,
    ) -> Result<Self, DeviceConfigError> {
        if cfg.address > 0x7F {
            return Err(DeviceConfigError::new(format!(
                "invalid device address {:#04x}, bus addresses are 7 bits",
                cfg.address
            )));
        }
        debug!("mcp4725 dac at {:#04x}", cfg.address);
        Ok(Self {
            bus,
            address: cfg.address,
        })
    }

    pub fn into_port(self) -> Port {
        Port::float(self)
    }
}

impl<T: Transport> PortAccessor<f64> for Mcp4725Port<T> {
    fn get(&mut self) -> Result<f64, PortError> {
        let mut frame = [0u8; READBACK_BYTES];
        {
            let mut bus = lock_bus(&self.bus);
            bus.select(self.address)?;
            bus.set_rate(TRANSFER_RATE_HZ)?;
            bus.read(&mut frame)?;
        }
        //twelve DAC bits straddle the second and third bytes
        let dac = (u16::from(frame[1]) << 4) + (u16::from(frame[2]) >> 4);
        Ok(f64::from(dac) / DAC_MAX)
    }

    fn set(&mut self, value: f64) -> Result<(), PortError> {
        let output = (value * DAC_MAX) as u16;
        let command = [
            WRITE_DAC_COMMAND,
            (output >> 4) as u8,
            ((output & 0b1111) << 4) as u8,
        ];
        let mut bus = lock_bus(&self.bus);
        bus.select(self.address)?;
        bus.set_rate(TRANSFER_RATE_HZ)?;
        bus.write(&command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portio_core::mem::{MemTransport, Transfer};

    fn port(bus: &Arc<Mutex<MemTransport>>) -> Mcp4725Port<MemTransport> {
        Mcp4725Port::try_build(&Mcp4725DeviceConfig::default(), bus.clone()).unwrap()
    }

    #[test]
    fn set_emits_the_write_dac_command() {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        let mut dac = port(&bus);

        dac.set(1.0).unwrap();
        assert_eq!(
            bus.lock().unwrap().log().to_vec(),
            vec![
                Transfer::Select(0x60),
                Transfer::Rate(TRANSFER_RATE_HZ),
                //0xFFF split across the two data bytes
                Transfer::Write(vec![WRITE_DAC_COMMAND, 0xFF, 0xF0]),
            ]
        );
    }

    #[test]
    fn half_scale_lands_mid_code() {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        let mut dac = port(&bus);

        dac.set(0.5).unwrap();
        let log = bus.lock().unwrap().log().to_vec();
        //4095 / 2 truncates to code 2047
        assert_eq!(log[2], Transfer::Write(vec![WRITE_DAC_COMMAND, 0x7F, 0xF0]));
    }

    #[test]
    fn get_unpacks_the_status_frame() {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        //settings byte, then DAC code 0x800 as [0x80, 0x00]
        bus.lock().unwrap().registers[..3].copy_from_slice(&[0xC0, 0x80, 0x00]);
        let mut dac = port(&bus);

        let value = dac.get().unwrap();
        assert_eq!(value, 2048.0 / 4095.0);
    }

    #[test]
    fn rejects_out_of_range_addresses() {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        let cfg = Mcp4725DeviceConfig { address: 0x80 };
        assert!(Mcp4725Port::try_build(&cfg, bus).is_err());
    }
}
