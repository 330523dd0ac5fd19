//! Hex text for radio payloads

use heapless::{String, Vec};

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes as upper-case hex
///
/// Returns `None` if the text does not fit in `N` characters.
pub fn encode_upper<const N: usize>(data: &[u8]) -> Option<String<N>> {
    let mut text = String::new();
    for &byte in data {
        text.push(DIGITS[(byte >> 4) as usize] as char).ok()?;
        text.push(DIGITS[(byte & 0x0F) as usize] as char).ok()?;
    }
    Some(text)
}

/// Decode hex text in either case
///
/// Returns `None` for odd length, a non-hex character, or more than `N`
/// bytes of output.
pub fn decode<const N: usize>(text: &str) -> Option<Vec<u8, N>> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return None;
    }

    let mut data = Vec::new();
    for pair in digits.chunks_exact(2) {
        data.push((nibble(pair[0])? << 4) | nibble(pair[1])?).ok()?;
    }
    Some(data)
}

fn nibble(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).map(|value| value as u8)
}

/// True for a non-empty, even-length string of hex digits
pub fn is_hex_payload(text: &str) -> bool {
    !text.is_empty() && text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit())
}
