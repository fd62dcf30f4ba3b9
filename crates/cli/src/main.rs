use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bookshelf_app::{Application, Validator};
use bookshelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "bookshelf", version, about = "Validated book catalogue service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service until Ctrl-C or SIGTERM
    Serve,
    /// Check a JSON book record against the schema without storing it
    Validate {
        /// Path to a JSON file holding one book record
        file: PathBuf,
        /// Treat this as the current year instead of reading the clock
        #[arg(long)]
        year: Option<i64>,
    },
    /// Print the resolved settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let settings = load_settings()?;
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "bookshelf serve starting");
            Application::build(settings)?.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { file, year } => validate(&file, year),
        Command::Config => {
            let settings = load_settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_settings() -> anyhow::Result<Settings> {
    Settings::load().with_context(|| "failed to load Bookshelf settings")
}

fn validate(file: &Path, year: Option<i64>) -> anyhow::Result<ExitCode> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let candidate: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let validator = year.map(Validator::at_year).unwrap_or_default();
    match validator.validate(&candidate) {
        Ok(book) => {
            println!("valid: {} ({})", book.title, book.isbn);
            Ok(ExitCode::SUCCESS)
        }
        Err(violations) => {
            for message in violations.messages() {
                println!("invalid: {}", message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
