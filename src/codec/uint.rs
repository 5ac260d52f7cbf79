//! Decimal ASCII encoding of a single value

/// Maximum number of input bytes a decode will look at
pub const MAX_SCAN_LEN: usize = 99;

/// Errors produced when decoding a written value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("invalid digit {byte:#04x} at offset {offset}")]
    InvalidDigit { byte: u8, offset: usize },

    #[error("value does not fit in 64 bits")]
    Overflow,
}

/// Encode a value as minimal decimal ASCII (`0` -> `"0"`, no leading zeros)
pub fn encode_uint(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decode a decimal value written by a client.
///
/// Only the first [`MAX_SCAN_LEN`] bytes are considered, and decoding stops at
/// the first `\n` or NUL.
pub fn decode_uint(bytes: &[u8]) -> Result<u64, ParseError> {
    let digits = value_bytes(bytes);
    if digits.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut value: u64 = 0;
    for (offset, &byte) in digits.iter().enumerate() {
        if !byte.is_ascii_digit() {
            return Err(ParseError::InvalidDigit { byte, offset });
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or(ParseError::Overflow)?;
    }

    Ok(value)
}

/// Number of bytes a decode consumes: everything up to and including the
/// terminator, capped at [`MAX_SCAN_LEN`].
pub fn scanned_len(bytes: &[u8]) -> usize {
    let window = scan_window(bytes);
    match terminator_offset(window) {
        Some(pos) => pos + 1,
        None => window.len(),
    }
}

fn scan_window(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len().min(MAX_SCAN_LEN)]
}

fn terminator_offset(window: &[u8]) -> Option<usize> {
    window.iter().position(|&b| b == b'\n' || b == 0)
}

fn value_bytes(bytes: &[u8]) -> &[u8] {
    let window = scan_window(bytes);
    match terminator_offset(window) {
        Some(pos) => &window[..pos],
        None => window,
    }
}
