//!Register access helper: byte-addressable register I/O against one device on
//!a shared transport, with bit-level operations layered on top.
//!
//!Registers are passed as `impl Into<u8>`, so callers can use a typed
//!register enum for a documented register map and still reach undocumented
//!registers with raw numeric addresses.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use tracing::debug;

use crate::bits::BitRange;
use crate::error::{PortBuildError, PortError};
use crate::transport::Transport;

pub const DEFAULT_RATE_HZ: u32 = 100_000;
const DEFAULT_REG_BUFFER_SIZE: usize = 4;
const DEFAULT_DATA_BUFFER_SIZE: usize = 42;

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceConfig {
    ///7-bit bus address of the device.
    pub address: u8,
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
    ///Capacity of the outbound staging buffer (register selector + payload).
    #[serde(default = "default_reg_buffer_size")]
    pub reg_buffer_size: usize,
    ///Capacity of the inbound staging buffer.
    #[serde(default = "default_data_buffer_size")]
    pub data_buffer_size: usize,
}

fn default_rate_hz() -> u32 {
    DEFAULT_RATE_HZ
}
fn default_reg_buffer_size() -> usize {
    DEFAULT_REG_BUFFER_SIZE
}
fn default_data_buffer_size() -> usize {
    DEFAULT_DATA_BUFFER_SIZE
}

impl RegisterDeviceConfig {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            rate_hz: DEFAULT_RATE_HZ,
            reg_buffer_size: DEFAULT_REG_BUFFER_SIZE,
            data_buffer_size: DEFAULT_DATA_BUFFER_SIZE,
        }
    }
}

///One peripheral on the shared bus: its address, transfer rate, and the two
///staging buffers reused across calls (never resized, never reallocated).
///
///The transport is shared between handles, so each logical operation takes
///the bus lock for its whole duration; read-modify-write bit operations hold
///it across both phases. Nothing here retries: transport failures surface as
///`PortError::Io` at the call site.
#[derive(Debug)]
pub struct RegisterDevice<T: Transport> {
    bus: Arc<Mutex<T>>,
    dev: DeviceState,
}

#[derive(Debug)]
struct DeviceState {
    address: u8,
    rate_hz: u32,
    reg_buf: Vec<u8>,
    data_buf: Vec<u8>,
}

///Take the bus lock, recovering the guard if a previous holder panicked.
pub fn lock_bus<T: Transport>(bus: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    match bus.lock() {
        Ok(bus) => bus,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<T: Transport> RegisterDevice<T> {
    pub fn try_build(cfg: &RegisterDeviceConfig, bus: Arc<Mutex<T>>) -> Result<Self, PortBuildError> {
        if cfg.address > 0x7F {
            return Err(PortBuildError::from_string(format!(
                "invalid device address {:#04x}, bus addresses are 7 bits",
                cfg.address
            )));
        }
        if cfg.reg_buffer_size < 2 {
            return Err(PortBuildError::message(
                "outbound buffer must hold at least a register selector and one data byte",
            ));
        }
        if cfg.data_buffer_size == 0 {
            return Err(PortBuildError::message("inbound buffer capacity must be nonzero"));
        }
        debug!(
            "register device at {:#04x}, {} Hz, buffers {}/{} bytes",
            cfg.address, cfg.rate_hz, cfg.reg_buffer_size, cfg.data_buffer_size
        );
        Ok(Self {
            bus,
            dev: DeviceState {
                address: cfg.address,
                rate_hz: cfg.rate_hz,
                reg_buf: vec![0u8; cfg.reg_buffer_size],
                data_buf: vec![0u8; cfg.data_buffer_size],
            },
        })
    }

    pub fn address(&self) -> u8 {
        self.dev.address
    }

    ///Read `count` bytes starting at `reg`: one register-select write, then
    ///one `count`-byte read. Returns a view into the inbound buffer, valid
    ///until the next operation.
    pub fn read_bytes(&mut self, reg: impl Into<u8>, count: usize) -> Result<&[u8], PortError> {
        let mut bus = lock_bus(&self.bus);
        self.dev.read_bytes(&mut *bus, reg.into(), count)
    }

    pub fn read_byte(&mut self, reg: impl Into<u8>) -> Result<u8, PortError> {
        let mut bus = lock_bus(&self.bus);
        self.dev.read_byte(&mut *bus, reg.into())
    }

    ///Read two consecutive registers as one big-endian word (most significant
    ///byte first, the common sensor register layout).
    pub fn read_word(&mut self, reg: impl Into<u8>) -> Result<u16, PortError> {
        let mut bus = lock_bus(&self.bus);
        let bytes = self.dev.read_bytes(&mut *bus, reg.into(), 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_bit(&mut self, reg: impl Into<u8>, bit_num: u8) -> Result<bool, PortError> {
        let range = BitRange::single(bit_num)?;
        Ok(self.read_bits(reg, range)? != 0)
    }

    pub fn read_bits(&mut self, reg: impl Into<u8>, range: BitRange) -> Result<u8, PortError> {
        let mut bus = lock_bus(&self.bus);
        let byte = self.dev.read_byte(&mut *bus, reg.into())?;
        Ok(range.extract(byte))
    }

    ///Write one byte: register selector and data go out in a single 2-byte
    ///transfer, no separate select phase.
    pub fn write_byte(&mut self, reg: impl Into<u8>, data: u8) -> Result<(), PortError> {
        let mut bus = lock_bus(&self.bus);
        self.dev.write_bytes(&mut *bus, reg.into(), &[data])
    }

    pub fn write_bytes(&mut self, reg: impl Into<u8>, data: &[u8]) -> Result<(), PortError> {
        let mut bus = lock_bus(&self.bus);
        self.dev.write_bytes(&mut *bus, reg.into(), data)
    }

    pub fn write_word(&mut self, reg: impl Into<u8>, data: u16) -> Result<(), PortError> {
        let mut bus = lock_bus(&self.bus);
        self.dev.write_bytes(&mut *bus, reg.into(), &data.to_be_bytes())
    }

    ///Read-modify-write of a single bit. The bus lock is held across both
    ///phases, but unrelated writers to the same register must still be
    ///serialized by the caller.
    pub fn write_bit(&mut self, reg: impl Into<u8>, bit_num: u8, value: bool) -> Result<(), PortError> {
        let range = BitRange::single(bit_num)?;
        self.write_bits(reg, range, value as u8)
    }

    ///Read-modify-write of a bit range: bits outside the range keep their
    ///current value.
    pub fn write_bits(&mut self, reg: impl Into<u8>, range: BitRange, value: u8) -> Result<(), PortError> {
        let reg = reg.into();
        let mut bus = lock_bus(&self.bus);
        let current = self.dev.read_byte(&mut *bus, reg)?;
        self.dev.write_bytes(&mut *bus, reg, &[range.insert(current, value)])
    }
}

impl DeviceState {
    fn select<T: Transport>(&self, bus: &mut T) -> Result<(), PortError> {
        bus.select(self.address)?;
        bus.set_rate(self.rate_hz)?;
        Ok(())
    }

    fn read_bytes<'a, T: Transport>(
        &'a mut self,
        bus: &mut T,
        reg: u8,
        count: usize,
    ) -> Result<&'a [u8], PortError> {
        if count > self.data_buf.len() {
            return Err(PortError::config(format!(
                "read of {} bytes exceeds inbound buffer capacity {}",
                count,
                self.data_buf.len()
            )));
        }
        self.reg_buf[0] = reg;
        self.select(bus)?;
        bus.write(&self.reg_buf[..1])?;
        bus.read(&mut self.data_buf[..count])?;
        Ok(&self.data_buf[..count])
    }

    fn read_byte<T: Transport>(&mut self, bus: &mut T, reg: u8) -> Result<u8, PortError> {
        Ok(self.read_bytes(bus, reg, 1)?[0])
    }

    fn write_bytes<T: Transport>(&mut self, bus: &mut T, reg: u8, data: &[u8]) -> Result<(), PortError> {
        if 1 + data.len() > self.reg_buf.len() {
            return Err(PortError::config(format!(
                "write of {} data bytes exceeds outbound buffer capacity {}",
                data.len(),
                self.reg_buf.len()
            )));
        }
        self.reg_buf[0] = reg;
        self.reg_buf[1..=data.len()].copy_from_slice(data);
        self.select(bus)?;
        bus.write(&self.reg_buf[..1 + data.len()])?;
        Ok(())
    }
}
