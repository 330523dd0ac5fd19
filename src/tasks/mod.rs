//! Application tasks
//!
//! The flows themselves are plain async functions over the helper types so
//! they run under host tests. The embedded binary wraps the `*_task` loops
//! in embassy tasks joined by [`SAMPLE_CHANNEL`].

pub mod lora;
pub mod sensor;

pub use lora::{bring_up, transmit_sample};
pub use sensor::collect_sample;

#[cfg(feature = "embedded")]
pub use embedded::{SampleReceiver, SampleSender, SAMPLE_CHANNEL};
#[cfg(feature = "embedded")]
pub use lora::lora_task;
#[cfg(feature = "embedded")]
pub use sensor::sensor_task;

#[cfg(feature = "embedded")]
mod embedded {
    use crate::config::telemetry::SAMPLE_QUEUE_LEN;
    use crate::protocol::Sample;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::{Channel, Receiver, Sender};

    /// Type alias for the sample channel sender
    pub type SampleSender = Sender<'static, CriticalSectionRawMutex, Sample, SAMPLE_QUEUE_LEN>;

    /// Type alias for the sample channel receiver
    pub type SampleReceiver = Receiver<'static, CriticalSectionRawMutex, Sample, SAMPLE_QUEUE_LEN>;

    /// Samples on their way from the sensor task to the radio
    pub static SAMPLE_CHANNEL: Channel<CriticalSectionRawMutex, Sample, SAMPLE_QUEUE_LEN> =
        Channel::new();
}
