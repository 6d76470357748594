// ABOUTME: Korsana CLI - drives the AI coach from the command line
// ABOUTME: Wires configuration, logging, database, counters, and the LLM backend; prints JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Create the tables in the configured database
//! korsana-cli init-db
//!
//! # Ask the coach a question
//! korsana-cli ask --user 6f1c... "Should I run a tempo tomorrow?"
//!
//! # Generate a 7-day plan and write it to the calendar
//! korsana-cli plan --user 6f1c... --days 7 --confirm
//!
//! # Show the last 20 turns
//! korsana-cli history --user 6f1c... --limit 20
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use korsana_coach::config::ServerConfig;
use korsana_coach::database::Database;
use korsana_coach::logging::{LoggingConfig, SERVICE_NAME};
use korsana_coach::services::CoachService;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "korsana-cli",
    about = "Korsana AI Coach CLI",
    long_about = "Command-line access to the Korsana coach: chat, insights, training plans, and history."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Create any missing tables
    InitDb,

    /// Send a message to the coach
    Ask {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Message text (max 1000 characters)
        message: String,
    },

    /// Generate a one-off dashboard insight
    Insight {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Generate a training plan starting tomorrow
    Plan {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Days to plan (1-14; other values fall back to 7)
        #[arg(long, default_value = "7")]
        days: u32,

        /// Write the plan to the calendar
        #[arg(long)]
        confirm: bool,
    },

    /// Show conversation history
    History {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Number of turns (default 50)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show current quota usage
    Usage {
        /// User id
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        "debug".clone_into(&mut logging.level);
    }
    logging.init()?;
    info!("{} CLI", SERVICE_NAME);

    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    let database = Database::connect(&config.database_url).await?;

    match cli.command {
        Command::InitDb => commands::init_db(&database).await,
        Command::Ask { user, message } => {
            commands::ask(&coach_service(&config, &database).await?, user, &message).await
        }
        Command::Insight { user } => {
            commands::insight(&coach_service(&config, &database).await?, user).await
        }
        Command::Plan {
            user,
            days,
            confirm,
        } => commands::plan(&coach_service(&config, &database).await?, user, days, confirm).await,
        Command::History { user, limit } => {
            commands::history(&coach_service(&config, &database).await?, user, limit).await
        }
        Command::Usage { user } => {
            commands::usage(&coach_service(&config, &database).await?, user).await
        }
    }
}

/// Ensure the schema exists and wire the coach for a coaching command
async fn coach_service(config: &ServerConfig, database: &Database) -> Result<CoachService> {
    database.bootstrap_schema().await?;
    Ok(CoachService::from_config(config, database).await?)
}
