pub mod helper;

#[cfg(test)]
pub mod mock;

pub use helper::{BusError, ScanReport, SensorBus};
