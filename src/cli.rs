use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(
    name = "intake",
    version,
    about = "Classify uploaded recordings by schedule, rename, file, and keep a ledger"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the intake pipeline over the upload dir
    Process {
        /// Run exactly one cycle (the default)
        #[arg(long)]
        once: bool,
        /// Keep running, polling on the configured interval
        #[arg(long)]
        daemon: bool,
    },
    /// Show paths, configuration, and last-run health
    Status,
    /// Print the weekly table, or dry-run classify a timestamp
    Schedule {
        /// Local timestamp to classify, e.g. 2024-05-20T09:30
        #[arg(long)]
        at: Option<String>,
    },
    /// Show the most recent ledger rows
    Ledger {
        /// Maximum number of rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn print_report(report: &CommandReport) -> Result<()> {
    println!("{} {}", report.command, if report.ok { "ok" } else { "has issues" });
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        eprintln!("  ! {issue}");
    }
    if !report.ok {
        anyhow::bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Process { once, daemon } => {
            commands::process::run(&commands::process::ProcessOptions { once, daemon })?
        }
        Command::Status => commands::status::run()?,
        Command::Schedule { at } => commands::schedule::run(&commands::schedule::ScheduleOptions { at })?,
        Command::Ledger { limit } => commands::ledger::run(&commands::ledger::LedgerOptions { limit })?,
    };

    print_report(&report)
}
