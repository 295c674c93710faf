// ABOUTME: Shared test utilities and fixture builders for integration tests
// ABOUTME: Provides quiet logging setup, fixed clocks and meal window builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `pierre_meal_windows`
//!
//! Every fixture runs on 2025-03-14 in UTC with the default constraint policy
//! (bedtime 22:00, three hour buffer), so windows ending between 19:00 and
//! 22:00 fall inside the bedtime buffer.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pierre_meal_windows::errors::{AppError, AppResult};
use pierre_meal_windows::intelligence::redistribution::RedistributionResult;
use pierre_meal_windows::models::{LoggedMeal, MacroTargets, MealWindow, WindowPurpose};
use pierre_meal_windows::services::{InMemoryWindowStore, WindowCommitter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Instant on the fixture day
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
}

/// Window spanning `[start_hour:00, end_hour:00)` on the fixture day
pub fn window(
    name: &str,
    start_hour: u32,
    end_hour: u32,
    purpose: WindowPurpose,
    targets: MacroTargets,
) -> MealWindow {
    MealWindow::new(name, at(start_hour, 0), at(end_hour, 0), purpose, targets)
}

/// Roughly 500 kcal: 40P/50C/15F
pub fn trigger_targets() -> MacroTargets {
    MacroTargets::new(40.0, 50.0, 15.0)
}

/// Roughly 580 kcal: 40P/60C/20F
pub fn standard_targets() -> MacroTargets {
    MacroTargets::new(40.0, 60.0, 20.0)
}

/// Breakfast, a mid-morning snack, lunch, an afternoon snack and an evening meal
///
/// The evening meal ends at 20:00 and sits inside the bedtime buffer.
pub fn standard_day() -> Vec<MealWindow> {
    vec![
        window("breakfast", 7, 8, WindowPurpose::SustainedEnergy, trigger_targets()),
        window("snack", 9, 10, WindowPurpose::SustainedEnergy, standard_targets()),
        window("lunch", 13, 14, WindowPurpose::SustainedEnergy, standard_targets()),
        window("afternoon", 16, 17, WindowPurpose::FocusBoost, standard_targets()),
        window("dinner", 19, 20, WindowPurpose::SleepOptimization, standard_targets()),
    ]
}

/// Meal logged in the middle of `window`
pub fn meal_in(window: &MealWindow, macros: MacroTargets) -> LoggedMeal {
    let logged_at = window.start_time + (window.end_time - window.start_time) / 2;
    LoggedMeal::new(window.id, logged_at, macros)
}

/// In-memory store shared with an orchestrator
pub fn store_for(windows: &[MealWindow]) -> Arc<InMemoryWindowStore> {
    Arc::new(InMemoryWindowStore::with_windows(windows.to_vec()))
}

/// Absolute tolerance comparison
pub fn approx(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance
}

/// Committer that fails until told otherwise, counting attempts
#[derive(Debug, Default)]
pub struct FlakyCommitter {
    pub failing: AtomicBool,
    pub attempts: AtomicUsize,
    pub committed: AtomicUsize,
}

impl FlakyCommitter {
    pub fn failing() -> Self {
        Self {
            failing: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl WindowCommitter for FlakyCommitter {
    async fn commit(&self, _result: &RedistributionResult) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::storage("window storage unavailable"));
        }
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
