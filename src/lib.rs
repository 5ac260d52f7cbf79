// Summer - session accumulator device
// A running total per session, folded into a bounded ledger of cumulative sums
// and read back as decimal text.

pub mod cli;
pub mod codec;
pub mod config;
pub mod device;
pub mod logging;
pub mod server;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use codec::{decode_uint, encode_ledger, encode_uint, ParseError};
pub use config::SummerConfig;
pub use device::{Append, Control, Device, SessionLedger, MAX_SESSIONS};
