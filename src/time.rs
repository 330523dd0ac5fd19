//! Clock abstraction for timeouts and cooperative waits
//!
//! Blocking operations measure elapsed time and yield between polls through
//! this trait, so the same code runs on embassy and under host tests.

use core::future::Future;

/// Millisecond time source with an async delay
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin (monotonic)
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds, yielding to other tasks meanwhile
    fn delay_ms(&mut self, ms: u32) -> impl Future<Output = ()>;
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embedded")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embedded")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }

    async fn delay_ms(&mut self, ms: u32) {
        embassy_time::Timer::after(embassy_time::Duration::from_millis(ms as u64)).await;
    }
}
