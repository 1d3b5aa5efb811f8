//! Daybook CLI
//!
//! One-shot commands against the journal backend:
//! - Show a day's entry
//! - Like it or comment on it
//! - Publish today's entry
//! - Generate a config file
//!
//! `--offline` runs against fresh sample data that is discarded on exit.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use daybook::config::generate_default_config;
use daybook::render;
use daybook::{logging, Backend, CommentOutcome, Config, Journal, LikeOutcome, SessionStore};

#[derive(Parser)]
#[command(name = "daybook-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "One-shot commands for Daily Reflections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use built-in sample data instead of the hosted backend
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the entry for a date
    Show {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Like or unlike the entry for a date
    Like {
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Account email; the password comes from DAYBOOK_PASSWORD or a prompt
        #[arg(short, long)]
        email: String,
    },

    /// Comment on the entry for a date
    Comment {
        /// Comment text
        text: String,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        email: String,
    },

    /// Publish an entry for today
    Publish {
        /// Entry text
        text: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    logging::init(&config.logging);

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Show { date, format } => {
            let (session, backend) = connect(&config, cli.offline).await?;
            let mut journal =
                Journal::open(backend.data.clone(), &session, date.unwrap_or(today)).await;

            if format == "json" {
                let day = journal.day();
                let value = serde_json::json!({
                    "date": day.date,
                    "entry": day.entry,
                    "comments": day.comments,
                    "likes": day.likes,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                journal.toggle_comments();
                print!("{}", render::render_home(&journal));
            }
            journal.close();
        }

        Commands::Like { date, email } => {
            let (session, backend) = connect(&config, cli.offline).await?;
            sign_in(&backend, &email).await?;
            let mut journal =
                Journal::open(backend.data.clone(), &session, date.unwrap_or(today)).await;

            match journal.toggle_like().await {
                LikeOutcome::Liked(_) => println!("Liked ({} likes).", journal.like_count()),
                LikeOutcome::Unliked(_) => {
                    println!("Like removed ({} likes).", journal.like_count())
                }
                LikeOutcome::Skipped(reason) => bail!("Nothing to like: {:?}", reason),
                LikeOutcome::Failed => bail!("Like failed, see log for details"),
            }
            journal.close();
        }

        Commands::Comment { text, date, email } => {
            let (session, backend) = connect(&config, cli.offline).await?;
            sign_in(&backend, &email).await?;
            let mut journal =
                Journal::open(backend.data.clone(), &session, date.unwrap_or(today)).await;

            journal.set_draft(text);
            match journal.add_comment().await {
                CommentOutcome::Added(comment) => println!("Comment {} added.", comment.id),
                CommentOutcome::Skipped(reason) => bail!("Comment not sent: {:?}", reason),
                CommentOutcome::Failed => bail!("Comment failed, see log for details"),
            }
            journal.close();
        }

        Commands::Publish { text } => {
            let (session, backend) = connect(&config, cli.offline).await?;
            let mut journal = Journal::new(backend.data.clone(), &session, today);
            match journal.publish_entry(&text).await {
                Some(entry) => println!("Published entry {} for {}.", entry.id, entry.date),
                None => bail!("Entry not published"),
            }
            journal.close();
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Build the backend and resolve who is signed in
async fn connect(config: &Config, offline: bool) -> anyhow::Result<(SessionStore, Backend)> {
    let session = SessionStore::new();
    let backend = if offline {
        Backend::offline(&session).await
    } else {
        config.gateway.validate()?;
        Backend::remote(&config.gateway, &session).context("Failed to create gateway client")?
    };
    session.resolve_initial(backend.auth.as_ref()).await;
    Ok((session, backend))
}

async fn sign_in(backend: &Backend, email: &str) -> anyhow::Result<()> {
    let password = match std::env::var("DAYBOOK_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            let prompt = format!("Password for {}", email);
            tokio::task::spawn_blocking(move || {
                dialoguer::Password::new().with_prompt(prompt).interact()
            })
            .await?
            .context("Failed to read password")?
        }
    };

    let user = backend
        .auth
        .sign_in_with_password(email, &password)
        .await
        .context("Sign-in failed")?;
    tracing::info!(user_id = %user.id, "Signed in");
    Ok(())
}
