//! Hex-text payload codec.
//!
//! Transmit data for the `I2C` command arrives as hex characters, two per
//! byte (`"0FE1"` is the two bytes `0x0F 0xE1`). Both nibble cases are
//! accepted.

use heapless::Vec;

/// Errors from decoding a hex-text payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    /// A character outside `[0-9a-fA-F]`
    InvalidDigit,
    /// Hex text must come in whole byte pairs
    OddLength,
    /// Decoded payload exceeds the destination capacity
    TooLong,
}

fn nibble(c: u8) -> Result<u8, HexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HexError::InvalidDigit),
    }
}

/// Decode hex text into raw bytes.
pub fn decode<const N: usize>(text: &str) -> Result<Vec<u8, N>, HexError> {
    let text = text.as_bytes();
    if text.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    let mut out = Vec::new();
    for pair in text.chunks_exact(2) {
        let byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;
        out.push(byte).map_err(|_| HexError::TooLong)?;
    }
    Ok(out)
}
