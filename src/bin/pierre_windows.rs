// ABOUTME: Pierre meal windows CLI - replays redistribution decisions against a day plan file
// ABOUTME: Evaluates logged meals and missed windows, optionally applying the proposal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Evaluate a logged meal against a day plan
//! pierre-windows evaluate-meal --plan plan.json --meal meal.json --now 2025-03-14T12:30:00Z
//!
//! # Evaluate every missed window and apply the resulting proposal
//! pierre-windows sweep-missed --plan plan.json --now 2025-03-14T15:00:00Z --accept
//!
//! # Print the effective constraint policy (environment overrides applied)
//! pierre-windows show-constraints
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pierre_core::models::LoggedMeal;
use pierre_intelligence::config::{ConstraintOverrides, RedistributionConstraints};
use pierre_meal_windows::logging::LoggingConfig;
use pierre_meal_windows::plan::DayPlan;
use pierre_meal_windows::services::{
    EvaluationOutcome, InMemoryWindowStore, RedistributionOrchestrator,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "pierre-windows",
    about = "Pierre meal window redistribution CLI",
    long_about = "Replays trigger evaluation and macro redistribution against a JSON day plan."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Per-user constraint overrides (JSON file)
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Evaluate a logged meal against its window
    EvaluateMeal {
        /// Day plan JSON file
        #[arg(long)]
        plan: PathBuf,

        /// Logged meal JSON file
        #[arg(long)]
        meal: PathBuf,

        /// Evaluation time (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Apply the proposal and print the updated windows
        #[arg(long)]
        accept: bool,
    },

    /// Evaluate windows that ended with nothing logged
    SweepMissed {
        /// Day plan JSON file
        #[arg(long)]
        plan: PathBuf,

        /// Evaluation time (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Apply the proposal and print the updated windows
        #[arg(long)]
        accept: bool,
    },

    /// Print the effective constraint policy
    ShowConstraints,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    LoggingConfig::from_env().init()?;

    let constraints = load_constraints(cli.overrides.as_deref())?;

    match cli.command {
        Command::EvaluateMeal {
            plan,
            meal,
            now,
            accept,
        } => {
            let plan = load_plan(&plan)?;
            let meal: LoggedMeal = serde_json::from_str(&fs::read_to_string(&meal)?)?;
            let now = now.unwrap_or_else(Utc::now);
            let store = Arc::new(InMemoryWindowStore::with_windows(plan.windows.clone()));
            let orchestrator = RedistributionOrchestrator::new(constraints, store.clone());

            let outcome = orchestrator
                .handle_meal_logged(&meal, &plan.windows, now)
                .await?;
            store.record_meal(&meal)?;
            finish(&orchestrator, &store, outcome, accept).await?;
        }
        Command::SweepMissed { plan, now, accept } => {
            let plan = load_plan(&plan)?;
            let now = now.unwrap_or_else(Utc::now);
            let store = Arc::new(InMemoryWindowStore::with_windows(plan.windows.clone()));
            let orchestrator = RedistributionOrchestrator::new(constraints, store.clone());

            let outcome = orchestrator.sweep_missed_windows(&plan.windows, now).await?;
            finish(&orchestrator, &store, outcome, accept).await?;
        }
        Command::ShowConstraints => print_json(&constraints)?,
    }

    Ok(())
}

fn load_plan(path: &Path) -> Result<DayPlan> {
    let plan = DayPlan::load(path)?;
    info!(
        user_id = %plan.user_id,
        date = %plan.date,
        windows = plan.windows.len(),
        planned_kcal = plan.planned_calories(),
        "Day plan loaded"
    );
    Ok(plan)
}

fn load_constraints(overrides: Option<&Path>) -> Result<RedistributionConstraints> {
    let base = RedistributionConstraints::load()?;
    let Some(path) = overrides else {
        return Ok(base);
    };
    let overrides: ConstraintOverrides = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(base.with_overrides(&overrides)?)
}

async fn finish(
    orchestrator: &RedistributionOrchestrator,
    store: &InMemoryWindowStore,
    outcome: EvaluationOutcome,
    accept: bool,
) -> Result<()> {
    print_json(&outcome)?;

    if let (true, EvaluationOutcome::Proposed { pending }) = (accept, &outcome) {
        orchestrator.accept(pending.proposal_id).await?;
        info!(proposal_id = %pending.proposal_id, "Proposal applied");
        print_json(&store.snapshot())?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
