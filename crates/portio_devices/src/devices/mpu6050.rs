//!MPU-6050 six-axis inertial sensor.
//!
//!Scale factors come from sections 6.1 and 6.2 of the data sheet, for the
//!power-on full-scale ranges of 250 deg/s and 2 g.

use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use portio_core::bits::BitRange;
use portio_core::error::PortError;
use portio_core::register::{RegisterDevice, RegisterDeviceConfig};
use portio_core::transport::Transport;
use serde::Deserialize;
use tracing::debug;

use crate::error::DeviceConfigError;

const WHO_AM_I_REGISTER: u8 = 0x75;
const ACCEL_OUT_REGISTER: u8 = 0x3B;
const GYRO_CONFIG_REGISTER: u8 = 0x1B;
const ACCEL_CONFIG_REGISTER: u8 = 0x1C;
const PWR_MGMT_1_REGISTER: u8 = 0x6B;

const EXPECTED_ID: u8 = 0x68;
const DEVICE_RESET_BIT: u8 = 7;
const RESET_WAIT: Duration = Duration::from_millis(150);

///Accelerometer, temperature and gyro registers are consecutive and read as
///one burst.
const MOTION_FRAME_BYTES: usize = 14;

const GYRO_SCALER: f64 = 1.0 / 131.0;
const ACCEL_SCALER: f64 = 1.0 / 16384.0;
const TEMP_SCALER: f64 = 1.0 / 340.0;
const TEMP_OFFSET_C: f64 = 36.53;

#[derive(Deserialize, Debug)]
pub struct Mpu6050DeviceConfig {
    pub address: u8,
}

impl Default for Mpu6050DeviceConfig {
    fn default() -> Self {
        Self { address: 0x68 }
    }
}

///Gyro full-scale range, as the FS_SEL field of GYRO_CONFIG.
#[derive(Deserialize, Clone, Copy, Debug)]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    fn fs_sel(self) -> u8 {
        match self {
            GyroRange::Dps250 => 0b00,
            GyroRange::Dps500 => 0b01,
            GyroRange::Dps1000 => 0b10,
            GyroRange::Dps2000 => 0b11,
        }
    }
}

///Accelerometer full-scale range, as the AFS_SEL field of ACCEL_CONFIG.
#[derive(Deserialize, Clone, Copy, Debug)]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    fn afs_sel(self) -> u8 {
        match self {
            AccelRange::G2 => 0b00,
            AccelRange::G4 => 0b01,
            AccelRange::G8 => 0b10,
            AccelRange::G16 => 0b11,
        }
    }
}

///One burst read of the motion registers, scaled to g, degrees C and
///degrees per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFrame {
    pub accel: [f64; 3],
    pub temp_c: f64,
    pub gyro: [f64; 3],
}

impl MotionFrame {
    fn from_bytes(bytes: &[u8]) -> Self {
        let word = |i: usize| i16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]) as f64;
        Self {
            accel: [
                word(0) * ACCEL_SCALER,
                word(1) * ACCEL_SCALER,
                word(2) * ACCEL_SCALER,
            ],
            temp_c: word(3) * TEMP_SCALER + TEMP_OFFSET_C,
            gyro: [
                word(4) * GYRO_SCALER,
                word(5) * GYRO_SCALER,
                word(6) * GYRO_SCALER,
            ],
        }
    }

    ///Roll angle in degrees, from gravity alone. Only meaningful when the
    ///sensor is not accelerating.
    pub fn roll(&self) -> f64 {
        self.accel[1].atan2(self.accel[2]).to_degrees()
    }

    ///Pitch angle in degrees, from gravity alone.
    pub fn pitch(&self) -> f64 {
        let [x, y, z] = self.accel;
        (-x / (y * y + z * z).sqrt()).atan().to_degrees()
    }
}

#[derive(Debug)]
pub struct Mpu6050Device<T: Transport> {
    dev: RegisterDevice<T>,
}

impl<T: Transport> Mpu6050Device<T> {
    ///Attach to the sensor and verify its identity register before anything
    ///else talks to it.
    pub fn try_build(
        cfg: &Mpu6050DeviceConfig,
        bus: Arc<Mutex<T>>,
    ) -> Result<Self, DeviceConfigError> {
        let reg_cfg = RegisterDeviceConfig::new(cfg.address);
        let mut dev = RegisterDevice::try_build(&reg_cfg, bus)
            .map_err(|err| DeviceConfigError::new(format!("{:?}", err)))?;

        let id = dev.read_byte(WHO_AM_I_REGISTER)?;
        if id != EXPECTED_ID {
            return Err(DeviceConfigError::new(format!(
                "device at {:#04x} identifies as {:#04x}, expected {:#04x}",
                cfg.address, id, EXPECTED_ID
            )));
        }
        debug!("mpu6050 found at {:#04x}", cfg.address);
        Ok(Self { dev })
    }

    ///Reset the sensor and bring it out of sleep. The data sheet wants a
    ///settle delay after the reset bit before further register writes.
    pub fn wake(&mut self) -> Result<(), PortError> {
        self.dev
            .write_bit(PWR_MGMT_1_REGISTER, DEVICE_RESET_BIT, true)?;
        sleep(RESET_WAIT);
        self.dev.write_byte(PWR_MGMT_1_REGISTER, 0)
    }

    pub fn set_gyro_range(&mut self, range: GyroRange) -> Result<(), PortError> {
        let field = BitRange::new(4, 2)?;
        self.dev.write_bits(GYRO_CONFIG_REGISTER, field, range.fs_sel())
    }

    pub fn set_accel_range(&mut self, range: AccelRange) -> Result<(), PortError> {
        let field = BitRange::new(4, 2)?;
        self.dev
            .write_bits(ACCEL_CONFIG_REGISTER, field, range.afs_sel())
    }

    pub fn read_motion(&mut self) -> Result<MotionFrame, PortError> {
        let bytes = self.dev.read_bytes(ACCEL_OUT_REGISTER, MOTION_FRAME_BYTES)?;
        Ok(MotionFrame::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portio_core::mem::MemTransport;

    fn bus_with_id() -> Arc<Mutex<MemTransport>> {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        bus.lock().unwrap().registers[WHO_AM_I_REGISTER as usize] = EXPECTED_ID;
        bus
    }

    #[test]
    fn identity_mismatch_fails_the_build() {
        let bus = Arc::new(Mutex::new(MemTransport::new()));
        bus.lock().unwrap().registers[WHO_AM_I_REGISTER as usize] = 0x34;

        let err = Mpu6050Device::try_build(&Mpu6050DeviceConfig::default(), bus).unwrap_err();
        assert!(err.message.contains("identifies as 0x34"));
    }

    #[test]
    fn motion_frame_applies_the_data_sheet_scalers() {
        let bus = bus_with_id();
        {
            let mut bus = bus.lock().unwrap();
            let base = ACCEL_OUT_REGISTER as usize;
            //accel z = one g
            bus.registers[base + 4..base + 6].copy_from_slice(&16384i16.to_be_bytes());
            //temp raw 0 reads as the offset
            bus.registers[base + 6..base + 8].copy_from_slice(&0i16.to_be_bytes());
            //gyro x = one degree per second
            bus.registers[base + 8..base + 10].copy_from_slice(&131i16.to_be_bytes());
        }

        let mut dev = Mpu6050Device::try_build(&Mpu6050DeviceConfig::default(), bus).unwrap();
        let frame = dev.read_motion().unwrap();
        assert_eq!(frame.accel, [0.0, 0.0, 1.0]);
        assert_eq!(frame.temp_c, 36.53);
        assert_eq!(frame.gyro, [1.0, 0.0, 0.0]);

        //flat and level
        assert_eq!(frame.roll(), 0.0);
        assert_eq!(frame.pitch(), 0.0);
    }

    #[test]
    fn wake_clears_power_management() {
        let bus = bus_with_id();
        bus.lock().unwrap().registers[PWR_MGMT_1_REGISTER as usize] = 0b0100_0000;

        let mut dev = Mpu6050Device::try_build(&Mpu6050DeviceConfig::default(), bus.clone()).unwrap();
        dev.wake().unwrap();
        assert_eq!(bus.lock().unwrap().registers[PWR_MGMT_1_REGISTER as usize], 0);
    }

    #[test]
    fn range_fields_leave_the_rest_of_the_config_register() {
        let bus = bus_with_id();
        bus.lock().unwrap().registers[GYRO_CONFIG_REGISTER as usize] = 0b1110_0001;

        let mut dev = Mpu6050Device::try_build(&Mpu6050DeviceConfig::default(), bus.clone()).unwrap();
        dev.set_gyro_range(GyroRange::Dps2000).unwrap();
        assert_eq!(
            bus.lock().unwrap().registers[GYRO_CONFIG_REGISTER as usize],
            0b1111_1001
        );

        dev.set_accel_range(AccelRange::G8).unwrap();
        assert_eq!(
            bus.lock().unwrap().registers[ACCEL_CONFIG_REGISTER as usize],
            0b0001_0000
        );
    }
}
