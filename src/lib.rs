#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod lora;
pub mod protocol;
pub mod sensors;
pub mod serial;
pub mod tasks;
pub mod time;

// Logger output depends on esp-println, only available with embedded feature
#[cfg(feature = "embedded")]
pub mod debug;
