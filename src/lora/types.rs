//! LoRa-E5 modem settings

use crate::config::lora_defaults;

/// Valid spreading factors for LoRa modulation
const SPREADING_FACTORS: core::ops::RangeInclusive<u8> = 7..=12;

/// Bandwidths accepted by the module, in kHz
const BANDWIDTHS_KHZ: [u16; 3] = [125, 250, 500];

/// Modem operating mode, as numbered by `AT+MODE`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// LoRaWAN network stack
    LoRaWan = 0,
    /// FSK modulation
    Fsk = 1,
    /// Raw point-to-point test mode
    Test = 2,
}

/// Configuration for LoRa P2P modulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoraConfig {
    /// Centre frequency in Hz
    pub frequency_hz: u32,
    /// Spreading factor (7-12)
    pub spreading_factor: u8,
    /// Bandwidth in kHz (125, 250, 500)
    pub bandwidth_khz: u16,
    /// Preamble length in symbols
    pub preamble_len: u16,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: lora_defaults::FREQUENCY_HZ,
            spreading_factor: lora_defaults::SPREADING_FACTOR,
            bandwidth_khz: lora_defaults::BANDWIDTH_KHZ,
            preamble_len: lora_defaults::PREAMBLE_LEN,
            tx_power_dbm: lora_defaults::TX_POWER_DBM,
        }
    }
}

impl LoraConfig {
    /// Whether the module can be asked to use these settings
    pub fn is_valid(&self) -> bool {
        self.frequency_hz != 0
            && SPREADING_FACTORS.contains(&self.spreading_factor)
            && BANDWIDTHS_KHZ.contains(&self.bandwidth_khz)
            && self.preamble_len != 0
    }
}
