//! `summer serve` - run the device host

use crate::config::SummerConfig;
use crate::server::Server;
use crate::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind (default: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port (default: 7240)
    #[arg(long)]
    pub port: Option<u16>,

    /// Sessions the ledger keeps before dropping new ones (default: 100)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Buffer size for reads that name no capacity (default: 4096)
    #[arg(long)]
    pub read_buffer: Option<usize>,

    /// Close sessions idle for this many milliseconds, 0 to disable (default: 300000)
    #[arg(long)]
    pub idle_timeout_ms: Option<u64>,

    /// Config file (default: ./summer.toml, then ~/.summer/summer.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    /// Config file values with command-line overrides applied
    pub fn resolve(&self) -> Result<SummerConfig> {
        let mut config = SummerConfig::discover(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(capacity) = self.capacity {
            config.device.capacity = capacity;
        }
        if let Some(read_buffer) = self.read_buffer {
            config.server.read_buffer = read_buffer;
        }
        if let Some(idle_timeout_ms) = self.idle_timeout_ms {
            config.server.idle_timeout_ms = idle_timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.resolve()?;
    let server = Server::bind(&config).await?;

    println!(
        "{}",
        format!("✓ summer device listening on {}", server.local_addr()?).green()
    );
    println!(
        "  ledger capacity: {}, read buffer: {} bytes",
        config.device.capacity, config.server.read_buffer
    );

    server.run().await
}
