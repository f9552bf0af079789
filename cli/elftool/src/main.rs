//! solo5-elftool: Solo5 application manifest generator and ELF note inspector.

mod commands;
mod logger;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "solo5-elftool",
    version,
    about = "Solo5 application manifest generator and ELF note inspector"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the ABI target and version from BINARY
    Abi {
        #[arg(value_name = "BINARY")]
        binary: PathBuf,
    },
    /// Dump the application manifest from BINARY
    Dump {
        #[arg(value_name = "BINARY")]
        binary: PathBuf,
    },
    /// Generate application manifest from SOURCE, writing to OUTPUT
    Gen {
        /// Manifest source (.json, or .toml)
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
        /// Generated C source
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Reject unknown device types and duplicate device names
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("warning: could not install logger: {e}");
    }

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Abi { binary } => commands::abi::run(&binary),
        Commands::Dump { binary } => commands::dump::run(&binary),
        Commands::Gen {
            source,
            output,
            strict,
        } => commands::generate::run(&source, &output, strict),
    }
}
