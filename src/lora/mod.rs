pub mod e5;
pub mod types;

pub use e5::LoraE5;
pub use types::{LoraConfig, Mode};
