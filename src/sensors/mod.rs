pub mod sht4x;

pub use sht4x::{ClimateReading, SensorError};
