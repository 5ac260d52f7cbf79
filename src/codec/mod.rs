//! Text Codec
//!
//! Converts between non-negative integers and their decimal ASCII form, and
//! formats the session ledger as the byte stream returned by a device read:
//! - `uint`: single values (`encode_uint`, `decode_uint`)
//! - `ledger`: comma separated ledger payloads (`encode_ledger`, `decode_ledger`)

mod ledger;
mod uint;

pub use ledger::{decode_ledger, encode_ledger, SEPARATOR};
pub use uint::{decode_uint, encode_uint, scanned_len, ParseError, MAX_SCAN_LEN};
