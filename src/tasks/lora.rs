//! LoRa telemetry flows
//!
//! Bring the LoRa-E5 into P2P test mode and send sample packets through it.
//! Retries live in [`lora_task`]; the flows report the first failure.

use crate::lora::{LoraConfig, LoraE5, Mode};
use crate::protocol::{encode_packet, Sample};
use crate::serial::{ChannelError, SerialPort};
use crate::time::Clock;

/// Prepare the module for P2P transmission
///
/// A failed version query is only logged; every other step must succeed.
pub async fn bring_up<S, C>(modem: &mut LoraE5<S, C>, config: &LoraConfig) -> Result<(), ChannelError>
where
    S: SerialPort,
    C: Clock,
{
    modem.ping().await?;

    match modem.version().await {
        Ok(version) => log::info!("LoRa-E5: {}", version.lines().next().unwrap_or("")),
        Err(error) => log::warn!("LoRa-E5: version query failed ({:?})", error),
    }

    modem.set_mode(Mode::Test).await?;
    modem.configure_p2p(config).await?;

    log::info!(
        "LoRa-E5: P2P at {} Hz, SF{}, {} kHz, {} dBm",
        config.frequency_hz,
        config.spreading_factor,
        config.bandwidth_khz,
        config.tx_power_dbm
    );
    Ok(())
}

/// Send one sample as a versioned, checksummed packet
pub async fn transmit_sample<S, C>(modem: &mut LoraE5<S, C>, sample: &Sample) -> Result<(), ChannelError>
where
    S: SerialPort,
    C: Clock,
{
    let packet = encode_packet(sample);
    modem.transmit(&packet).await?;
    log::debug!("LoRa TX: sample at {}s", sample.timestamp);
    Ok(())
}

/// Task that owns the modem and transmits every queued sample
///
/// Bring-up is retried every `BRING_UP_RETRY_MS` until it succeeds. A
/// transmit that times out means the module went away, so the next sample
/// repeats the bring-up first.
#[cfg(feature = "embedded")]
pub async fn lora_task<S, C>(mut modem: LoraE5<S, C>, receiver: super::SampleReceiver)
where
    S: SerialPort,
    C: Clock,
{
    use crate::config::telemetry::BRING_UP_RETRY_MS;

    let config = LoraConfig::default();
    let mut ready = false;

    loop {
        while !ready {
            match bring_up(&mut modem, &config).await {
                Ok(()) => ready = true,
                Err(error) => {
                    log::warn!("LoRa-E5: bring-up failed ({:?}), retrying", error);
                    modem.channel_mut().clock_mut().delay_ms(BRING_UP_RETRY_MS).await;
                }
            }
        }

        let sample = receiver.receive().await;
        match transmit_sample(&mut modem, &sample).await {
            Ok(()) => {}
            Err(ChannelError::Timeout) => {
                log::warn!("LoRa TX: no answer, sample at {}s lost", sample.timestamp);
                ready = false;
            }
            Err(error) => {
                log::warn!("LoRa TX: failed ({:?})", error);
            }
        }
    }
}
