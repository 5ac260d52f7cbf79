//! `summer init` - write a default summer.toml

use crate::config::{SummerConfig, CONFIG_FILE};
use crate::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Directory to write summer.toml into (default: current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Write to ~/.summer instead of the current directory
    #[arg(short, long, conflicts_with = "dir")]
    pub global: bool,

    /// Overwrite an existing summer.toml
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let dir = match (&args.dir, args.global) {
        (Some(dir), _) => dir.clone(),
        (None, true) => SummerConfig::user_config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?,
        (None, false) => std::env::current_dir()?,
    };

    match write_default(&dir, args.force)? {
        Some(path) => println!("{}", format!("✓ Wrote {}", path.display()).green()),
        None => println!(
            "{}",
            format!(
                "{} already exists in {} (use --force to overwrite)",
                CONFIG_FILE,
                dir.display()
            )
            .yellow()
        ),
    }
    Ok(())
}

/// Write the default config into `dir`. `None` when a config exists and `force` is off.
pub fn write_default(dir: &Path, force: bool) -> Result<Option<PathBuf>> {
    if dir.join(CONFIG_FILE).exists() && !force {
        return Ok(None);
    }
    SummerConfig::default().save(dir).map(Some)
}
