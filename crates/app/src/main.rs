use std::error::Error;

use services::{AppServices, SessionRequest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::{Command, parse_args, prepare_sqlite_file, print_usage};

async fn run() -> Result<(), Box<dyn Error>> {
    let (command, config) =
        parse_args(std::env::args().skip(1), |key| std::env::var(key).ok()).map_err(|e| {
            print_usage();
            e
        })?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    debug!(db = %config.db_url, bank = %config.bank, "configuration resolved");

    // Open + migrate SQLite and load the bank here so the library crates stay free of process concerns.
    prepare_sqlite_file(&config.db_url)?;
    let app = AppServices::new_sqlite(&config.db_url, &config.bank, config.asset_base).await?;
    let svc = app.quiz_loop();

    match command {
        Command::Rounds => {
            println!("Rounds:   {}", svc.bank().rounds().join(", "));
            println!("Subjects: {}", svc.bank().subjects().join(", "));
        }
        Command::Quiz { round, subjects } => {
            let started = svc
                .start_session(SessionRequest::Normal { round, subjects }, 0)
                .await?;
            terminal::run_session(&svc, started).await?;
        }
        Command::Continue => {
            let started = svc.continue_last_quiz().await?;
            terminal::run_session(&svc, started).await?;
        }
        Command::Checked { subjects } => {
            let started = svc.start_checked_quiz(subjects).await?;
            terminal::run_session(&svc, started).await?;
        }
        Command::ContinueChecked => {
            let started = svc.continue_last_checked_quiz().await?;
            terminal::run_session(&svc, started).await?;
        }
        Command::ExportChecked => match svc.export_checked().await? {
            Some(text) => println!("{text}"),
            None => eprintln!("No bookmarked questions to export."),
        },
        Command::ImportChecked { path, mode } => {
            let text = std::fs::read_to_string(&path)?;
            let count = svc.import_checked(&text, mode).await?;
            println!("Imported {count} bookmarked questions.");
        }
        Command::ExportExplanations => match svc.export_explanations().await? {
            Some(text) => println!("{text}"),
            None => eprintln!("No saved explanations to export."),
        },
        Command::ClearExplanations => {
            svc.clear_explanations().await?;
            println!("Saved explanations deleted.");
        }
        Command::Help => {}
    }
    Ok(())
}

/// `RUST_LOG` directives when set and valid, otherwise `info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        ))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
