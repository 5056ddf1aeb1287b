//! crash - compile circuit definitions and settle them interactively.
//!
//! Usage:
//!   crash check <file>
//!   crash compile <file>
//!   crash analyze <file>
//!   crash repl <file> [--history <path>]

use anyhow::Result;
use clap::{Parser, Subcommand};
use crash_run::console::Console;
use crash_run::{CONSOLE_FILTER, DEFAULT_FILTER, commands, init_logging};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "crash")]
#[command(about = "Compile stateful circuit definitions and run them to a stable output")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a file and report diagnostics
    Check { file: PathBuf },
    /// Print the state-threading form of every circuit
    Compile { file: PathBuf },
    /// Print the dependency analysis as JSON
    Analyze { file: PathBuf },
    /// Start the interactive console
    Repl {
        file: PathBuf,

        /// History file
        #[arg(long, default_value = ".crash_history")]
        history: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(match cli.command {
        Commands::Repl { .. } => CONSOLE_FILTER,
        _ => DEFAULT_FILTER,
    });

    if let Err(e) = run(cli.command) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Check { file } => println!("{}", commands::check(&file)?),
        Commands::Compile { file } => println!("{}", commands::compile(&file)?),
        Commands::Analyze { file } => println!("{}", commands::analyze(&file)?),
        Commands::Repl { file, history } => {
            let registry = commands::load_registry(&file)?;
            info!(circuits = registry.len(), file = %file.display(), "loaded");
            Console::new(&registry).run(&history)?;
        }
    }
    Ok(())
}
