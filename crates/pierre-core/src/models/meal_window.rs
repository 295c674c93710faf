// ABOUTME: Meal window model - a time-boxed macro target within a day plan
// ABOUTME: WindowPurpose and WindowFlexibility classify how a window may be adjusted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::macros::MacroTargets;
use super::nutrition::LoggedMeal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physiological role of a meal window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WindowPurpose {
    /// Fuel before training
    PreWorkout,
    /// Recovery meal right after training
    PostWorkout,
    /// Larger window meant to absorb energy
    MetabolicBoost,
    /// Steady energy through the day
    SustainedEnergy,
    /// Light evening window supporting sleep
    SleepOptimization,
    /// Window supporting cognitive focus
    FocusBoost,
    /// General recovery window
    Recovery,
}

impl WindowPurpose {
    /// Stable snake_case name used in logs and explanations
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreWorkout => "pre_workout",
            Self::PostWorkout => "post_workout",
            Self::MetabolicBoost => "metabolic_boost",
            Self::SustainedEnergy => "sustained_energy",
            Self::SleepOptimization => "sleep_optimization",
            Self::FocusBoost => "focus_boost",
            Self::Recovery => "recovery",
        }
    }
}

/// How rigid the window's timing is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowFlexibility {
    /// Timing is fixed, never relaxed near bedtime
    Strict,
    /// Default
    #[default]
    Moderate,
    /// Timing may drift freely
    Flexible,
}

/// A time interval `[start_time, end_time)` with macro targets and consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealWindow {
    /// Window identifier
    pub id: Uuid,
    /// Display name ("Breakfast", "Pre-run snack")
    #[serde(default)]
    pub name: String,
    /// Inclusive start of the window
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window
    pub end_time: DateTime<Utc>,
    /// Physiological role
    pub purpose: WindowPurpose,
    /// Timing rigidity
    #[serde(default)]
    pub flexibility: WindowFlexibility,
    /// Planned macros
    pub target_macros: MacroTargets,
    /// Macros logged so far
    #[serde(default)]
    pub consumed_macros: MacroTargets,
}

impl MealWindow {
    /// Create an empty window with no consumption
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        purpose: WindowPurpose,
        target_macros: MacroTargets,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_time,
            end_time,
            purpose,
            flexibility: WindowFlexibility::default(),
            target_macros,
            consumed_macros: MacroTargets::zero(),
        }
    }

    /// Builder-style flexibility setter
    #[must_use]
    pub const fn with_flexibility(mut self, flexibility: WindowFlexibility) -> Self {
        self.flexibility = flexibility;
        self
    }

    /// Nothing has been logged against this window yet
    #[must_use]
    pub fn has_no_consumption(&self) -> bool {
        self.consumed_macros.calories() <= 0.0
    }

    /// Future window with nothing logged: the only kind the engine may adjust
    #[must_use]
    pub fn is_untouched(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now && self.has_no_consumption()
    }

    /// Window ended without anything logged
    #[must_use]
    pub fn is_missed(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now && self.has_no_consumption()
    }

    /// Copy of this window with the meal's macros added to consumption
    #[must_use]
    pub fn with_meal(&self, meal: &LoggedMeal) -> Self {
        Self {
            consumed_macros: self.consumed_macros.add(&meal.macros),
            ..self.clone()
        }
    }
}
