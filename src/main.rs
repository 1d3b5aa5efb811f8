//! Daybook
//!
//! Interactive journal reader. Renders the current page, reads one command
//! per line and applies it.
//!
//! # Configuration
//!
//! Config file (`--config`, else `~/.config/daybook/config.toml` or
//! `./daybook.toml`), overridden by environment variables:
//! - `DAYBOOK_GATEWAY_URL`, `DAYBOOK_GATEWAY_ANON_KEY`: hosted backend
//! - `DAYBOOK_SHARE_URL`: link handed to the share target
//! - `DAYBOOK_LOG_LEVEL`, `DAYBOOK_LOG_FORMAT`: logging (`RUST_LOG` wins)

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use daybook::shell::{Command, Reply, Shell};
use daybook::{logging, Backend, Config, Journal, SessionStore, Sharer};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read and react to Daily Reflections, one day at a time")]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Date to open (YYYY-MM-DD, default: today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Use built-in sample data instead of the hosted backend
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    logging::init(&config.logging);

    tracing::info!("Daybook v{}", env!("CARGO_PKG_VERSION"));

    let session = SessionStore::new();
    let backend = if args.offline {
        Backend::offline(&session).await
    } else {
        config.gateway.validate()?;
        Backend::remote(&config.gateway, &session).context("Failed to create gateway client")?
    };
    session.resolve_initial(backend.auth.as_ref()).await;

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let journal = Journal::open(backend.data.clone(), &session, date).await;
    let mut shell = Shell::new(journal, backend.auth.clone(), Sharer::terminal(), config);

    run(&mut shell).await?;

    shell.close();
    tracing::info!("Daybook closed");
    Ok(())
}

async fn run(shell: &mut Shell) -> anyhow::Result<()> {
    println!("{}", shell.render());

    loop {
        let line = match prompt_line("> ").await? {
            Some(line) => line,
            None => return Ok(()),
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let message = match shell.execute(command).await {
            Reply::Quit => return Ok(()),
            Reply::Continue(message) => message,
            Reply::NeedPassword(email) => match prompt_password(&email).await? {
                Some(password) => Some(shell.login(&email, &password).await),
                None => None,
            },
        };

        println!("{}", shell.render());
        if let Some(message) = message {
            println!("{}", message);
        }
    }
}

/// Read one line from stdin; `None` at end of input
async fn prompt_line(prompt: &'static str) -> anyhow::Result<Option<String>> {
    tokio::task::spawn_blocking(move || -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then_some(line))
    })
    .await?
    .context("Failed to read input")
}

/// Ask for a password without echo; `None` when no terminal is attached
async fn prompt_password(email: &str) -> anyhow::Result<Option<String>> {
    let prompt = format!("Password for {}", email);
    let password = tokio::task::spawn_blocking(move || {
        dialoguer::Password::new().with_prompt(prompt).interact()
    })
    .await?;

    match password {
        Ok(password) => Ok(Some(password)),
        Err(e) => {
            tracing::warn!(error = %e, "Password prompt unavailable");
            println!("Cannot read a password here.");
            Ok(None)
        }
    }
}
