//! Sensirion SHT4x temperature/humidity sensor
//!
//! The sensor has no register map: a measurement is a one-byte command,
//! a conversion delay, then a plain 6-byte read of
//! `[T_msb, T_lsb, crc, RH_msb, RH_lsb, crc]`.

use crate::bus::{BusError, SensorBus};
use crate::time::Clock;
use crc::{Crc, CRC_8_NRSC_5};
use embedded_hal_async::i2c::I2c;

/// Sensirion word checksum (poly 0x31, init 0xFF)
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

/// Fixed bus address
pub const ADDRESS: u8 = 0x44;

/// Measure T and RH with high repeatability
const MEASURE_HIGH_PRECISION: u8 = 0xFD;

/// Worst-case conversion time for a high precision measurement
const MEASUREMENT_DELAY_MS: u32 = 10;

/// Two checked words
const READ_LEN: usize = 6;

/// Errors that can occur while reading the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Bus transaction failed (sensor absent, NACK, ...)
    Bus(BusError),
    /// A data word failed its checksum
    Crc,
}

impl From<BusError> for SensorError {
    fn from(error: BusError) -> Self {
        Self::Bus(error)
    }
}

/// Converted measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReading {
    /// Degrees Celsius × 100
    pub temperature_cx100: i16,
    /// Relative humidity percent × 100, clamped to 0..=10000
    pub humidity_pct_x100: u16,
}

/// Run one high precision measurement
pub async fn measure<I, C>(bus: &mut SensorBus<I>, clock: &mut C) -> Result<ClimateReading, SensorError>
where
    I: I2c,
    C: Clock,
{
    bus.write_command(ADDRESS, MEASURE_HIGH_PRECISION).await?;
    clock.delay_ms(MEASUREMENT_DELAY_MS).await;

    let mut raw = [0u8; READ_LEN];
    bus.read_raw(ADDRESS, &mut raw, READ_LEN).await?;

    let temperature = checked_word(&raw[0..3])?;
    let humidity = checked_word(&raw[3..6])?;

    Ok(ClimateReading {
        temperature_cx100: convert_temperature(temperature),
        humidity_pct_x100: convert_humidity(humidity),
    })
}

/// Big-endian word followed by its CRC-8
fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    if CRC8.checksum(&chunk[..2]) != chunk[2] {
        return Err(SensorError::Crc);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

/// T = -45 + 175 * raw / 65535, in hundredths of a degree
pub fn convert_temperature(raw: u16) -> i16 {
    (-4500 + (17500 * raw as i32) / 65535) as i16
}

/// RH = -6 + 125 * raw / 65535, in hundredths of a percent
pub fn convert_humidity(raw: u16) -> u16 {
    (-600 + (12500 * raw as i32) / 65535).clamp(0, 10000) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{MockI2c, MockOp};
    use crate::time::mock::MockClock;

    fn word(value: u16) -> [u8; 3] {
        let bytes = value.to_be_bytes();
        [bytes[0], bytes[1], CRC8.checksum(&bytes)]
    }

    #[test]
    fn test_crc_matches_datasheet() {
        assert_eq!(CRC8.checksum(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(convert_temperature(0), -4500);
        assert_eq!(convert_temperature(0xFFFF), 13000);
        assert_eq!(convert_temperature(0x6666), 2500);

        assert_eq!(convert_humidity(0), 0);
        assert_eq!(convert_humidity(0xFFFF), 10000);
        assert_eq!(convert_humidity(0x8000), 5650);
    }

    #[test]
    fn test_measure() {
        let i2c = MockI2c::new();
        i2c.add_device(ADDRESS);
        let mut data = [0u8; 6];
        data[..3].copy_from_slice(&word(0x6666));
        data[3..].copy_from_slice(&word(0x8000));
        i2c.queue_read(ADDRESS, &data);

        let mut bus = SensorBus::new(i2c.clone());
        let mut clock = MockClock::new();

        let reading = futures::executor::block_on(measure(&mut bus, &mut clock)).unwrap();
        assert_eq!(
            reading,
            ClimateReading {
                temperature_cx100: 2500,
                humidity_pct_x100: 5650,
            }
        );

        let log = i2c.transactions();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].ops, vec![MockOp::Write(vec![MEASURE_HIGH_PRECISION])]);
        assert_eq!(log[1].ops, vec![MockOp::Read(6)]);
        assert!(clock.now() >= MEASUREMENT_DELAY_MS as u64);
    }

    #[test]
    fn test_measure_bad_checksum() {
        let i2c = MockI2c::new();
        i2c.add_device(ADDRESS);
        let mut data = [0u8; 6];
        data[..3].copy_from_slice(&word(0x6666));
        data[3..].copy_from_slice(&word(0x8000));
        data[5] ^= 0x01;
        i2c.queue_read(ADDRESS, &data);

        let mut bus = SensorBus::new(i2c);
        let mut clock = MockClock::new();

        let result = futures::executor::block_on(measure(&mut bus, &mut clock));
        assert_eq!(result, Err(SensorError::Crc));
    }

    #[test]
    fn test_measure_without_sensor() {
        let mut bus = SensorBus::new(MockI2c::new());
        let mut clock = MockClock::new();

        let result = futures::executor::block_on(measure(&mut bus, &mut clock));
        assert_eq!(result, Err(SensorError::Bus(BusError::NoAcknowledge)));

        // Gave up before waiting for a conversion
        assert_eq!(clock.delay_count(), 0);
    }
}
