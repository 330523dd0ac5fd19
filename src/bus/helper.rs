//! I2C bus transaction helper
//!
//! Single-shot addressed transactions on a shared half-duplex bus. Register
//! reads write the register pointer and then read back under a repeated
//! START, so the device keeps its register context and no other master can
//! slip in between.

use crate::config::i2c;
use core::fmt;
use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::i2c::I2c;
use heapless::Vec;

/// Highest valid 7-bit address
const MAX_ADDRESS: u8 = 0x7F;

/// Errors that can occur during a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Address or data byte was not acknowledged
    NoAcknowledge,
    /// Any other failure reported by the bus driver
    Bus(ErrorKind),
    /// More bytes requested than the output buffer holds
    BufferTooSmall { requested: usize, capacity: usize },
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
}

impl BusError {
    fn from_hal<E: embedded_hal::i2c::Error>(error: E) -> Self {
        match error.kind() {
            ErrorKind::NoAcknowledge(_) => Self::NoAcknowledge,
            kind => Self::Bus(kind),
        }
    }
}

/// Addresses that acknowledged a bus scan, in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    addresses: Vec<u8, 128>,
}

impl ScanReport {
    /// Number of devices that answered
    pub fn count(&self) -> usize {
        self.addresses.len()
    }

    /// Answering addresses, lowest first
    pub fn addresses(&self) -> &[u8] {
        &self.addresses
    }

    /// Whether `address` answered the scan
    pub fn contains(&self, address: u8) -> bool {
        self.addresses.contains(&address)
    }

    /// Render the report, one zero-padded hex address per line
    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "I2C scan:")?;
        if self.addresses.is_empty() {
            return writeln!(out, "  (no devices)");
        }
        for address in &self.addresses {
            writeln!(out, "  0x{:02X}", address)?;
        }
        Ok(())
    }
}

/// Transaction helper owning the bus handle
pub struct SensorBus<I> {
    i2c: I,
}

impl<I: I2c> SensorBus<I> {
    /// Wrap an initialised bus (pins and clock already configured)
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give back the bus handle
    pub fn into_inner(self) -> I {
        self.i2c
    }

    /// Write a single command byte (no register address)
    pub async fn write_command(&mut self, address: u8, command: u8) -> Result<(), BusError> {
        self.write_burst(address, &[command]).await
    }

    /// Write a single byte to a device register
    pub async fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), BusError> {
        self.write_burst(address, &[register, value]).await
    }

    /// Write all of `data` in one transaction
    pub async fn write_burst(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        check_address(address)?;
        self.i2c
            .write(address, data)
            .await
            .map_err(BusError::from_hal)
    }

    /// Read `count` bytes starting at `register`
    ///
    /// On error the contents of `buffer` are unspecified.
    pub async fn read_from_register(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
        count: usize,
    ) -> Result<(), BusError> {
        let target = window(buffer, count)?;
        check_address(address)?;

        if target.is_empty() {
            return self.write_burst(address, &[register]).await;
        }

        self.i2c
            .write_read(address, &[register], target)
            .await
            .map_err(BusError::from_hal)
    }

    /// Read `count` bytes without selecting a register first
    ///
    /// For devices without a register map, or already pointed by an earlier
    /// write. On error the contents of `buffer` are unspecified.
    pub async fn read_raw(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        count: usize,
    ) -> Result<(), BusError> {
        let target = window(buffer, count)?;
        check_address(address)?;

        if target.is_empty() {
            return Ok(());
        }

        self.i2c
            .read(address, target)
            .await
            .map_err(BusError::from_hal)
    }

    /// Probe every valid address with a zero-length write
    pub async fn scan(&mut self) -> ScanReport {
        let mut report = ScanReport::default();

        for address in i2c::SCAN_FIRST_ADDRESS..=i2c::SCAN_LAST_ADDRESS {
            if self.i2c.write(address, &[]).await.is_ok() {
                log::info!("I2C device at 0x{:02X}", address);
                // Capacity covers the whole address range
                let _ = report.addresses.push(address);
            }
        }

        if report.addresses.is_empty() {
            log::info!("I2C scan: no devices");
        }
        report
    }
}

fn check_address(address: u8) -> Result<(), BusError> {
    if address > MAX_ADDRESS {
        return Err(BusError::InvalidAddress(address));
    }
    Ok(())
}

fn window(buffer: &mut [u8], count: usize) -> Result<&mut [u8], BusError> {
    let capacity = buffer.len();
    buffer.get_mut(..count).ok_or(BusError::BufferTooSmall {
        requested: count,
        capacity,
    })
}
