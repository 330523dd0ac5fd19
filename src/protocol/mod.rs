pub mod hex;
pub mod sample;

pub use sample::{decode_packet, encode_packet, PacketError, Sample};
