//! `summer send` - push values through one session, optionally read the ledger

use crate::codec;
use crate::config::SummerConfig;
use crate::server::{Client, Request, Response};
use crate::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Values to write, one write per value
    pub values: Vec<String>,

    /// Read the ledger afterwards in a new session, with an optional buffer capacity
    #[arg(short, long, num_args = 0..=1)]
    pub read: Option<Option<usize>>,

    /// Server address (default: from config)
    #[arg(long)]
    pub addr: Option<String>,

    /// Config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long)]
    pub json: bool,
}

/// Result of a `send` run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendReport {
    pub writes: Vec<WriteReport>,
    /// Session total before close
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<ReadReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    pub raw: String,
    /// Decoded entries; absent when the payload was cut short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<u64>>,
}

pub async fn run(args: SendArgs) -> Result<()> {
    let addr = match &args.addr {
        Some(addr) => addr.clone(),
        None => SummerConfig::discover(args.config.as_deref())?.listen_addr(),
    };

    let report = send(&addr, &args.values, args.read).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Write `values` in one session; then, if `read` is set, drain the ledger in a second one
pub async fn send(
    addr: &str,
    values: &[String],
    read: Option<Option<usize>>,
) -> Result<SendReport> {
    let mut report = SendReport::default();

    let mut client = Client::connect(addr).await?;
    for value in values {
        let write = match client.request(&Request::Write(value.as_bytes().to_vec())).await? {
            Response::Ok(consumed) => WriteReport {
                value: value.clone(),
                consumed: Some(consumed),
                error: None,
            },
            Response::Error(message) => WriteReport {
                value: value.clone(),
                consumed: None,
                error: Some(message),
            },
            other => anyhow::bail!("unexpected response to WRITE: {}", other),
        };
        report.writes.push(write);
    }
    report.total = match client.request(&Request::Get).await? {
        Response::Value(total) => total,
        other => anyhow::bail!("unexpected response to GET: {}", other),
    };
    client.close().await?;

    if let Some(capacity) = read {
        let mut client = Client::connect(addr).await?;
        let payload = match client.request(&Request::Read(capacity)).await? {
            Response::Data(payload) => payload,
            other => anyhow::bail!("unexpected response to READ: {}", other),
        };
        client.close().await?;

        report.read = Some(ReadReport {
            raw: String::from_utf8_lossy(&payload).into_owned(),
            entries: codec::decode_ledger(&payload).ok(),
        });
    }

    Ok(report)
}

fn print_report(report: &SendReport) {
    for write in &report.writes {
        match (&write.consumed, &write.error) {
            (Some(consumed), _) => {
                println!("   {} {} ({} bytes)", "✓".green(), write.value, consumed)
            }
            (None, Some(error)) => println!("   {} {}: {}", "✗".red(), write.value, error),
            (None, None) => {}
        }
    }
    println!("{}", format!("Session total: {}", report.total).cyan().bold());

    if let Some(read) = &report.read {
        match &read.entries {
            Some(entries) if entries.is_empty() => println!("{}", "Ledger is empty".yellow()),
            Some(entries) => {
                println!("{}", "Ledger:".green().bold());
                for (i, entry) in entries.iter().enumerate() {
                    println!("   {:>3}. {}", i + 1, entry);
                }
            }
            None => println!("{} {}", "Ledger (truncated):".yellow(), read.raw),
        }
    }
}
