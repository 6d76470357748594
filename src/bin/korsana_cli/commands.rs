// ABOUTME: Subcommand implementations for korsana-cli
// ABOUTME: Each command calls the coach service and prints the result as JSON on stdout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use korsana_coach::database::Database;
use korsana_coach::services::CoachService;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn init_db(database: &Database) -> Result<()> {
    database.bootstrap_schema().await?;
    info!("Schema ready");
    print_json(&json!({ "status": "ok" }))
}

pub async fn ask(coach: &CoachService, user: Uuid, message: &str) -> Result<()> {
    let reply = coach.send_message(user, message).await?;
    print_json(&reply)
}

pub async fn insight(coach: &CoachService, user: Uuid) -> Result<()> {
    let insight = coach.generate_insight(user).await?;
    print_json(&json!({ "insight": insight }))
}

pub async fn plan(coach: &CoachService, user: Uuid, days: u32, confirm: bool) -> Result<()> {
    let outcome = coach.generate_plan(user, days, confirm).await?;
    print_json(&outcome)
}

pub async fn history(coach: &CoachService, user: Uuid, limit: Option<u32>) -> Result<()> {
    let turns = coach.history(user, limit).await?;
    print_json(&json!({ "messages": turns }))
}

pub async fn usage(coach: &CoachService, user: Uuid) -> Result<()> {
    let usage = coach.usage(user).await?;
    print_json(&usage)
}
