// ABOUTME: Day plan snapshot - the set of meal windows produced by the external plan generator
// ABOUTME: JSON loading and structural validation of window snapshots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use pierre_core::errors::{AppError, AppResult};
use pierre_core::models::MealWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// A user's meal windows for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Owner of the plan
    pub user_id: Uuid,
    /// Day the windows belong to
    pub date: NaiveDate,
    /// Windows, in any order
    pub windows: Vec<MealWindow>,
}

impl DayPlan {
    /// Parse and validate a plan from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the plan fails validation
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let mut plan: Self = serde_json::from_str(json)?;
        plan.validate()?;
        plan.windows.sort_by_key(|window| window.start_time);
        Ok(plan)
    }

    /// Read a plan file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            AppError::storage(format!("Failed to read day plan {}", path.display())).with_source(e)
        })?;
        Self::from_json_str(&json)
    }

    /// Check ids are unique and every window has a positive duration
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found
    pub fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::with_capacity(self.windows.len());
        for window in &self.windows {
            if !seen.insert(window.id) {
                return Err(AppError::invalid_input(format!(
                    "Duplicate meal window id {}",
                    window.id
                ))
                .with_resource_id(window.id.to_string()));
            }
            if window.end_time <= window.start_time {
                return Err(AppError::invalid_input(format!(
                    "Meal window {} ends before it starts",
                    window.id
                ))
                .with_resource_id(window.id.to_string()));
            }
        }
        Ok(())
    }

    /// Total planned calories across all windows
    #[must_use]
    pub fn planned_calories(&self) -> f64 {
        self.windows
            .iter()
            .map(|window| window.target_macros.calories())
            .sum()
    }
}
