//! Ledger payloads: `"<entry>, <entry>, "` truncated to the reader's buffer

use super::uint::{decode_uint, encode_uint, ParseError};

/// Written after every entry, including the last
pub const SEPARATOR: &[u8] = b", ";

/// Format ledger entries for a read of at most `max_bytes` bytes.
///
/// The stream is cut at exactly `max_bytes`, possibly in the middle of an
/// entry. A short buffer gets a partial read, never an error.
pub fn encode_ledger(entries: &[u64], max_bytes: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for &entry in entries {
        if out.len() >= max_bytes {
            break;
        }
        out.extend_from_slice(&encode_uint(entry));
        out.extend_from_slice(SEPARATOR);
    }
    out.truncate(max_bytes);
    out
}

/// Parse a complete (untruncated) ledger payload back into entries
pub fn decode_ledger(payload: &[u8]) -> Result<Vec<u64>, ParseError> {
    let mut entries = Vec::new();
    let mut rest = payload;

    while !rest.is_empty() {
        let end = rest
            .windows(SEPARATOR.len())
            .position(|w| w == SEPARATOR)
            .unwrap_or(rest.len());
        entries.push(decode_uint(&rest[..end])?);
        rest = rest.get(end + SEPARATOR.len()..).unwrap_or(&[]);
    }

    Ok(entries)
}
