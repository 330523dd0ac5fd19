//! Debug logging via esp-println.
//!
//! Routes the `log` facade to the USB serial JTAG console. Messages carry
//! the uptime in milliseconds and the level.

use log::{LevelFilter, Log, Metadata, Record};

struct PrintlnLogger;

static LOGGER: PrintlnLogger = PrintlnLogger;

impl Log for PrintlnLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        esp_println::println!(
            "{:>8} {:<5} {}",
            embassy_time::Instant::now().as_millis(),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the logger.
///
/// Must be called once during startup before any task logs. A second call
/// keeps the first logger and only updates the level.
pub fn init(level: LevelFilter) {
    // Only fails if a logger is already installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
