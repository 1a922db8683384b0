//! CLI application that turns a RAT service-report PDF into a closing mask.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use console::style;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::extract;

/// Exit code for a missing argument or any other usage error.
const EXIT_USAGE: u8 = 1;

/// RAT to closing mask - Extract report fields and print the closing text
#[derive(Parser)]
#[command(name = "ratmask")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    extract: extract::ExtractArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{} logging already initialized", style("warning:").yellow());
    }

    match extract::run(&cli.extract, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("{} {:#}", style("error:").red().bold(), failure.error);
            ExitCode::from(failure.code)
        }
    }
}
