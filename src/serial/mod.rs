pub mod channel;
pub mod traits;

pub use channel::{format_command, AtChannel, ChannelError, CommandText, ResponseText, Terminators};
pub use traits::{IoSerial, SerialError, SerialPort};
