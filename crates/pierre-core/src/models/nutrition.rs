// ABOUTME: Nutrition tracking models for food intake analysis
// ABOUTME: LoggedMeal is a single intake event assigned to a meal window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::macros::MacroTargets;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A meal logged by the user and assigned to a meal window
///
/// Produced by the meal-logging collaborator (photo, voice or manual entry);
/// the window snapshot it is evaluated against does not yet include it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMeal {
    /// Unique identifier for this meal entry
    pub id: Uuid,
    /// Window the meal was assigned to
    pub window_id: Uuid,
    /// When the meal was logged
    pub logged_at: DateTime<Utc>,
    /// Macros contained in the meal
    pub macros: MacroTargets,
    /// Meal description or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LoggedMeal {
    /// Create a meal entry with a fresh id
    #[must_use]
    pub fn new(window_id: Uuid, logged_at: DateTime<Utc>, macros: MacroTargets) -> Self {
        Self {
            id: Uuid::new_v4(),
            window_id,
            logged_at,
            macros,
            description: None,
        }
    }

    /// Energy of the meal in kcal
    #[must_use]
    pub fn calories(&self) -> f64 {
        self.macros.calories()
    }
}
