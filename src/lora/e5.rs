//! Seeed LoRa-E5 AT command helpers
//!
//! Builds the module's AT commands and runs them over an [`AtChannel`].
//! Everything here is string formatting; timing and terminator handling
//! belong to the channel.

use crate::config::{at, channel};
use crate::lora::types::{LoraConfig, Mode};
use crate::protocol::hex;
use crate::serial::{format_command, AtChannel, ChannelError, CommandText, ResponseText, Terminators};
use crate::serial::traits::SerialPort;
use crate::time::Clock;

/// Prefix of the P2P transmit command
const TX_PREFIX: &str = "AT+TEST=TXLRPKT,";

/// LoRa-E5 modem on a command-response channel
pub struct LoraE5<S, C> {
    channel: AtChannel<S, C>,
}

impl<S, C> LoraE5<S, C>
where
    S: SerialPort,
    C: Clock,
{
    /// Wrap a channel to the module's UART
    pub fn new(channel: AtChannel<S, C>) -> Self {
        Self { channel }
    }

    /// Direct access to the channel for commands not covered here
    pub fn channel_mut(&mut self) -> &mut AtChannel<S, C> {
        &mut self.channel
    }

    /// Give back the channel
    pub fn into_channel(self) -> AtChannel<S, C> {
        self.channel
    }

    /// Check the module answers at all
    pub async fn ping(&mut self) -> Result<(), ChannelError> {
        self.send("AT").await
    }

    /// Firmware version report, including the trailing `OK`
    pub async fn version(&mut self) -> Result<ResponseText, ChannelError> {
        self.channel
            .send_command_collect_response(
                "AT+VER=?",
                Terminators::default(),
                channel::COMMAND_TIMEOUT_MS,
            )
            .await
    }

    /// Switch operating mode
    pub async fn set_mode(&mut self, mode: Mode) -> Result<(), ChannelError> {
        let command = format_command(format_args!("AT+MODE={}", mode as u8))?;
        self.send(&command).await
    }

    /// Apply P2P radio settings (test mode only)
    pub async fn configure_p2p(&mut self, config: &LoraConfig) -> Result<(), ChannelError> {
        if !config.is_valid() {
            log::warn!("refusing LoRa config {:?}", config);
            return Err(ChannelError::InvalidArgument);
        }

        let command = format_command(format_args!(
            "AT+TEST=RFCFG,{},{},{},{},{}",
            config.frequency_hz,
            config.spreading_factor,
            config.bandwidth_khz,
            config.preamble_len,
            config.tx_power_dbm
        ))?;
        self.send(&command).await
    }

    /// Transmit a payload given as hex text (test mode only)
    pub async fn transmit_hex(&mut self, payload: &str) -> Result<(), ChannelError> {
        if !hex::is_hex_payload(payload) {
            return Err(ChannelError::InvalidArgument);
        }

        let command = format_command(format_args!("{}{}", TX_PREFIX, payload))?;
        self.send(&command).await
    }

    /// Transmit raw bytes (test mode only)
    pub async fn transmit(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        let payload: CommandText = hex::encode_upper(data).ok_or(ChannelError::CommandTooLong)?;
        self.transmit_hex(&payload).await
    }

    async fn send(&mut self, command: &str) -> Result<(), ChannelError> {
        self.channel
            .send_command(command, at::OK, channel::COMMAND_TIMEOUT_MS, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::traits::mock::MockSerialPort;
    use crate::time::mock::MockClock;

    fn setup() -> (LoraE5<MockSerialPort, MockClock>, MockSerialPort) {
        let clock = MockClock::new();
        let port = MockSerialPort::with_clock(clock.clone());
        let modem = LoraE5::new(AtChannel::new(port.clone(), clock));
        (modem, port)
    }

    #[test]
    fn test_ping() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"AT\r\n", b"+AT: OK\r\n");

            modem.ping().await.unwrap();
            assert_eq!(port.tx_text(), "AT\r\n");
        });
    }

    #[test]
    fn test_ping_no_answer() {
        let (mut modem, _) = setup();

        futures::executor::block_on(async {
            assert_eq!(modem.ping().await, Err(ChannelError::Timeout));
        });
    }

    #[test]
    fn test_version() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"AT+VER=?\r\n", b"+VER: 4.0.11\r\nOK\r\n");

            let version = modem.version().await.unwrap();
            assert_eq!(version.as_str(), "+VER: 4.0.11\r\nOK");
        });
    }

    #[test]
    fn test_set_mode() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"AT+MODE=2\r\n", b"+MODE: 2\r\nOK\r\n");

            modem.set_mode(Mode::Test).await.unwrap();
            assert_eq!(port.tx_text(), "AT+MODE=2\r\n");
        });
    }

    #[test]
    fn test_configure_p2p() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"\r\n", b"OK\r\n");

            let config = LoraConfig {
                frequency_hz: 915_000_000,
                spreading_factor: 7,
                bandwidth_khz: 125,
                preamble_len: 8,
                tx_power_dbm: 14,
            };
            modem.configure_p2p(&config).await.unwrap();
            assert_eq!(port.tx_text(), "AT+TEST=RFCFG,915000000,7,125,8,14\r\n");
        });
    }

    #[test]
    fn test_configure_p2p_negative_power() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"\r\n", b"OK\r\n");

            let config = LoraConfig {
                tx_power_dbm: -3,
                ..LoraConfig::default()
            };
            modem.configure_p2p(&config).await.unwrap();
            assert!(port.tx_text().ends_with(",8,-3\r\n"));
        });
    }

    #[test]
    fn test_configure_p2p_invalid_not_sent() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            let config = LoraConfig {
                spreading_factor: 6,
                ..LoraConfig::default()
            };
            assert_eq!(
                modem.configure_p2p(&config).await,
                Err(ChannelError::InvalidArgument)
            );
        });

        assert!(port.get_tx_data().is_empty());
    }

    #[test]
    fn test_transmit_encodes_hex() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"AT+TEST=TXLRPKT,48656C6C6F\r\n", b"OK\r\n");

            modem.transmit(b"Hello").await.unwrap();
        });

        assert_eq!(port.tx_text(), "AT+TEST=TXLRPKT,48656C6C6F\r\n");
    }

    #[test]
    fn test_transmit_hex_rejects_bad_payload() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            assert_eq!(modem.transmit_hex("123").await, Err(ChannelError::InvalidArgument));
            assert_eq!(modem.transmit_hex("").await, Err(ChannelError::InvalidArgument));
            assert_eq!(modem.transmit_hex("ZZ").await, Err(ChannelError::InvalidArgument));
        });

        assert!(port.get_tx_data().is_empty());
    }

    #[test]
    fn test_transmit_too_long() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            // 114 hex digits fit on their own but not behind the command prefix
            let data = [0x55u8; 57];
            assert_eq!(modem.transmit(&data).await, Err(ChannelError::CommandTooLong));
        });

        assert!(port.get_tx_data().is_empty());
    }

    #[test]
    fn test_module_error_reply() {
        let (mut modem, port) = setup();

        futures::executor::block_on(async {
            port.reply_to(b"AT+VER=?\r\n", b"+VER: ERROR(-1)\r\n");

            assert_eq!(
                modem.version().await,
                Err(ChannelError::Rejected("+VER: ERROR".try_into().unwrap()))
            );
        });
    }
}
