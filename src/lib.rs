// ABOUTME: Main library entry point for the Korsana AI running coach backend
// ABOUTME: Quota enforcement, training context assembly, LLM dispatch, and plan persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Korsana Coach
//!
//! The AI-coaching core of the Korsana running platform. A request flows
//! through four stages:
//!
//! 1. **Quota**: [`quota::QuotaEnforcer`] admits or denies the request
//!    against global-daily, per-user-hourly, and per-user-daily counters.
//! 2. **Context**: [`context::ContextBuilder`] assembles a snapshot of the
//!    runner's goal, recent training, weekly trend, and upcoming workouts.
//! 3. **Generation**: an [`llm::LlmProvider`] (Gemini preferred, Claude as the
//!    alternate) produces the reply.
//! 4. **Persistence**: chat turns go to the conversation store; confirmed
//!    plans are parsed by [`plan::parse_plan`] and written to the calendar.
//!
//! [`services::CoachService`] ties the stages together for the HTTP layer
//! and the `korsana-cli` binary.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use korsana_coach::config::ServerConfig;
//! use korsana_coach::database::Database;
//! use korsana_coach::errors::AppResult;
//! use korsana_coach::services::CoachService;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::connect(&config.database_url).await?;
//!     database.bootstrap_schema().await?;
//!
//!     let coach = CoachService::from_config(&config, &database).await?;
//!     let reply = coach
//!         .send_message(uuid::Uuid::new_v4(), "How should I taper?")
//!         .await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

/// Environment configuration
pub mod config;

/// Fixed values and configuration defaults
pub mod constants;

/// Training context snapshot assembly
pub mod context;

/// Collaborator traits and `SQLite` implementations
pub mod database;

/// Unified error handling
pub mod errors;

/// LLM provider abstraction and adapters
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Data models
pub mod models;

/// Plan decoding and calendar writes
pub mod plan;

/// Multi-window quota enforcement
pub mod quota;

/// Coach orchestration
pub mod services;
