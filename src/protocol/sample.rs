//! Sensor sample record and its radio packet
//!
//! # Packet Format
//!
//! ```text
//! [version: u8][sample: 17 bytes][crc16: u16 LE]
//! ```
//!
//! The sample is little-endian in field order:
//! ```text
//! [timestamp: u32][temperature: i16][humidity: u16][co2: u16]
//! [pressure: u16][voc: u16][smoke: u16][status: u8]
//! ```
//!
//! The CRC is CRC-16-XMODEM (polynomial 0x1021, init 0x0000) over the
//! version byte and the sample. Packets go over the air as upper-case hex.

use crate::config::protocol::PACKET_VERSION;
use crc::{Crc, CRC_16_XMODEM};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Encoded sample length
pub const SAMPLE_LEN: usize = 17;

/// Encoded packet length: version + sample + CRC
pub const PACKET_LEN: usize = 1 + SAMPLE_LEN + 2;

/// Hex text length of a packet
pub const PACKET_HEX_LEN: usize = PACKET_LEN * 2;

/// Bits of [`Sample::status_flags`]
pub mod status {
    /// Temperature/humidity sensor absent or not answering
    pub const CLIMATE_MISSING: u8 = 0x01;
    /// Temperature/humidity reading failed its checksum
    pub const CLIMATE_CRC: u8 = 0x02;
}

/// One set of measurements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    /// Seconds since boot
    pub timestamp: u32,
    /// Degrees Celsius × 100
    pub temperature_cx100: i16,
    /// Relative humidity percent × 100
    pub humidity_pct_x100: u16,
    pub co2_ppm: u16,
    /// 0.1 hPa resolution
    pub pressure_dhpa: u16,
    pub voc_raw: u16,
    pub smoke_raw: u16,
    pub status_flags: u8,
}

/// Reasons a received packet is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// Not exactly [`PACKET_LEN`] bytes
    InvalidLength,
    /// Packet version not supported
    InvalidVersion,
    /// CRC-16 checksum mismatch
    CrcError,
}

impl Sample {
    /// Little-endian field-order layout
    pub fn to_bytes(&self) -> [u8; SAMPLE_LEN] {
        let mut out = [0u8; SAMPLE_LEN];
        out[0..4].copy_from_slice(&self.timestamp.to_le_bytes());
        out[4..6].copy_from_slice(&self.temperature_cx100.to_le_bytes());
        out[6..8].copy_from_slice(&self.humidity_pct_x100.to_le_bytes());
        out[8..10].copy_from_slice(&self.co2_ppm.to_le_bytes());
        out[10..12].copy_from_slice(&self.pressure_dhpa.to_le_bytes());
        out[12..14].copy_from_slice(&self.voc_raw.to_le_bytes());
        out[14..16].copy_from_slice(&self.smoke_raw.to_le_bytes());
        out[16] = self.status_flags;
        out
    }

    /// Inverse of [`Sample::to_bytes`]
    pub fn from_bytes(bytes: &[u8; SAMPLE_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);

        Self {
            timestamp: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            temperature_cx100: i16::from_le_bytes([bytes[4], bytes[5]]),
            humidity_pct_x100: u16_at(6),
            co2_ppm: u16_at(8),
            pressure_dhpa: u16_at(10),
            voc_raw: u16_at(12),
            smoke_raw: u16_at(14),
            status_flags: bytes[16],
        }
    }
}

/// Build the radio packet for a sample
pub fn encode_packet(sample: &Sample) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = PACKET_VERSION;
    packet[1..1 + SAMPLE_LEN].copy_from_slice(&sample.to_bytes());

    let crc = CRC.checksum(&packet[..1 + SAMPLE_LEN]);
    packet[1 + SAMPLE_LEN..].copy_from_slice(&crc.to_le_bytes());
    packet
}

/// Validate and parse a received packet
pub fn decode_packet(packet: &[u8]) -> Result<Sample, PacketError> {
    if packet.len() != PACKET_LEN {
        return Err(PacketError::InvalidLength);
    }

    if packet[0] != PACKET_VERSION {
        return Err(PacketError::InvalidVersion);
    }

    let received_crc = u16::from_le_bytes([packet[PACKET_LEN - 2], packet[PACKET_LEN - 1]]);
    if CRC.checksum(&packet[..1 + SAMPLE_LEN]) != received_crc {
        return Err(PacketError::CrcError);
    }

    let mut body = [0u8; SAMPLE_LEN];
    body.copy_from_slice(&packet[1..1 + SAMPLE_LEN]);
    Ok(Sample::from_bytes(&body))
}
