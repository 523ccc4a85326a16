pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "robo-advisor",
    about = "Robo Advisor operator CLI",
    long_about = "Replay dialog code hook events, inspect configuration, and run readiness checks.",
    after_help = "Examples:\n  robo-advisor invoke --event fixtures/events/dialog_valid.json\n  cat event.json | robo-advisor invoke\n  robo-advisor doctor --json\n  robo-advisor config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a dialog event through the intent dispatcher and print the response")]
    Invoke {
        #[arg(long, help = "Path to the event JSON (reads stdin when omitted or `-`)")]
        event: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, the allocation table, and intent registration")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Invoke { event } => commands::invoke::run(event.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
