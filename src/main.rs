use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use summer::Result;

#[derive(Parser)]
#[command(name = "summer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Session accumulator device", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default summer.toml
    Init(summer::cli::init::InitArgs),

    /// Run the device host
    Serve(summer::cli::serve::ServeArgs),

    /// Write values in one session and optionally read the ledger
    Send(summer::cli::send::SendArgs),

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    summer::logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => {
            summer::cli::init::run(args)?;
        }

        Commands::Serve(args) => {
            summer::cli::serve::run(args).await?;
        }

        Commands::Send(args) => {
            summer::cli::send::run(args).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "summer", &mut io::stdout());
        }
    }

    Ok(())
}
