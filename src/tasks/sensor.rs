//! Sensor acquisition
//!
//! Builds a [`Sample`] from whatever sensors answer. A missing or faulty
//! sensor never stops sampling; it only sets a status flag.

use crate::bus::SensorBus;
use crate::protocol::sample::status;
use crate::protocol::Sample;
use crate::sensors::{sht4x, SensorError};
use crate::time::Clock;
use embedded_hal_async::i2c::I2c;

/// Take one sample
pub async fn collect_sample<I, C>(bus: &mut SensorBus<I>, clock: &mut C) -> Sample
where
    I: I2c,
    C: Clock,
{
    let mut sample = Sample {
        timestamp: (clock.now_ms() / 1000) as u32,
        ..Sample::default()
    };

    match sht4x::measure(bus, clock).await {
        Ok(reading) => {
            sample.temperature_cx100 = reading.temperature_cx100;
            sample.humidity_pct_x100 = reading.humidity_pct_x100;
        }
        Err(SensorError::Crc) => {
            log::warn!("SHT4x: checksum mismatch");
            sample.status_flags |= status::CLIMATE_CRC;
        }
        Err(SensorError::Bus(error)) => {
            log::warn!("SHT4x: {:?}", error);
            sample.status_flags |= status::CLIMATE_MISSING;
        }
    }

    log::debug!("sample: {:?}", sample);
    sample
}

/// Scan the bus once, then sample forever
#[cfg(feature = "embedded")]
pub async fn sensor_task<I, C>(mut bus: SensorBus<I>, mut clock: C, sender: super::SampleSender)
where
    I: I2c,
    C: Clock,
{
    use crate::config::telemetry::SAMPLE_INTERVAL_MS;

    let report = bus.scan().await;
    let mut text: heapless::String<256> = heapless::String::new();
    if report.write_to(&mut text).is_ok() {
        log::info!("{}", text.trim_end());
    } else {
        log::info!("I2C scan: {} devices", report.count());
    }
    if !report.contains(sht4x::ADDRESS) {
        log::warn!("SHT4x not found at 0x{:02X}", sht4x::ADDRESS);
    }

    loop {
        let sample = collect_sample(&mut bus, &mut clock).await;
        if sender.try_send(sample).is_err() {
            log::warn!("sample queue full, dropping sample at {}s", sample.timestamp);
        }
        clock.delay_ms(SAMPLE_INTERVAL_MS).await;
    }
}
