// ABOUTME: Redistribution constraint policy - thresholds and clamps for meal window adjustment
// ABOUTME: Environment overrides, per-user overrides and validation for RedistributionConstraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Redistribution Constraint Configuration
//!
//! Defines the safety and physiological limits the redistribution engine must
//! honour. Constraints are plain values passed to every call; there is no
//! process-wide instance. `load()` starts from defaults, applies
//! `PIERRE_REDISTRIBUTION_*` environment overrides and validates the result.

use super::error::ConfigError;
use chrono::{Duration, NaiveTime};
use pierre_core::constants::{purpose_modifiers, redistribution as defaults};
use pierre_core::models::WindowPurpose;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Multipliers applied to proximity weights by window purpose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeModifiers {
    /// Pre-workout (lightly protected)
    pub pre_workout: f64,
    /// Post-workout (lightly protected)
    pub post_workout: f64,
    /// Sleep-optimization (strongly protected)
    pub sleep_optimization: f64,
    /// Metabolic-boost (preferentially absorbs change)
    pub metabolic_boost: f64,
    /// Sustained-energy, focus-boost and recovery
    pub neutral: f64,
}

impl PurposeModifiers {
    /// Modifier for a given purpose
    #[must_use]
    pub const fn for_purpose(&self, purpose: WindowPurpose) -> f64 {
        match purpose {
            WindowPurpose::PreWorkout => self.pre_workout,
            WindowPurpose::PostWorkout => self.post_workout,
            WindowPurpose::SleepOptimization => self.sleep_optimization,
            WindowPurpose::MetabolicBoost => self.metabolic_boost,
            WindowPurpose::SustainedEnergy
            | WindowPurpose::FocusBoost
            | WindowPurpose::Recovery => self.neutral,
        }
    }

    fn all(&self) -> [f64; 5] {
        [
            self.pre_workout,
            self.post_workout,
            self.sleep_optimization,
            self.metabolic_boost,
            self.neutral,
        ]
    }
}

impl Default for PurposeModifiers {
    fn default() -> Self {
        Self {
            pre_workout: purpose_modifiers::PRE_WORKOUT,
            post_workout: purpose_modifiers::POST_WORKOUT,
            sleep_optimization: purpose_modifiers::SLEEP_OPTIMIZATION,
            metabolic_boost: purpose_modifiers::METABOLIC_BOOST,
            neutral: purpose_modifiers::NEUTRAL,
        }
    }
}

/// Thresholds and clamps used by the trigger evaluator and redistribution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionConstraints {
    /// Relative calorie deviation required to fire a trigger (0.25 = 25%)
    pub deviation_threshold: f64,
    /// Lower calorie bound for an adjusted window
    pub min_calories_per_window: f64,
    /// Upper calorie bound for an adjusted window
    pub max_calories_per_window: f64,
    /// Fraction of original protein every adjusted window keeps
    pub min_protein_retention: f64,
    /// Carbohydrate cap per window (grams)
    pub max_carbs_per_window_g: f64,
    /// Fat cap per window (grams)
    pub max_fat_per_window_g: f64,
    /// Protected range before bedtime (hours)
    pub bedtime_buffer_hours: f64,
    /// Local wall-clock bedtime
    pub bedtime: NaiveTime,
    /// Offset of the user's wall clock from UTC, used to place bedtime
    pub utc_offset_minutes: i32,
    /// Windows starting this soon are exempt from the bedtime buffer
    pub imminent_window_minutes: i64,
    /// Meals this far outside their window count as early or late
    pub timing_tolerance_minutes: i64,
    /// Weight floor applied before normalization
    pub min_weight: f64,
    /// Purpose multipliers
    pub purpose_modifiers: PurposeModifiers,
}

impl Default for RedistributionConstraints {
    fn default() -> Self {
        Self {
            deviation_threshold: defaults::DEFAULT_DEVIATION_THRESHOLD,
            min_calories_per_window: defaults::DEFAULT_MIN_CALORIES_PER_WINDOW,
            max_calories_per_window: defaults::DEFAULT_MAX_CALORIES_PER_WINDOW,
            min_protein_retention: defaults::DEFAULT_MIN_PROTEIN_RETENTION,
            max_carbs_per_window_g: defaults::DEFAULT_MAX_CARBS_PER_WINDOW_G,
            max_fat_per_window_g: defaults::DEFAULT_MAX_FAT_PER_WINDOW_G,
            bedtime_buffer_hours: defaults::DEFAULT_BEDTIME_BUFFER_HOURS,
            bedtime: NaiveTime::from_hms_opt(defaults::DEFAULT_BEDTIME_HOUR, 0, 0)
                .unwrap_or(NaiveTime::MIN),
            utc_offset_minutes: 0,
            imminent_window_minutes: defaults::DEFAULT_IMMINENT_WINDOW_MINUTES,
            timing_tolerance_minutes: defaults::DEFAULT_TIMING_TOLERANCE_MINUTES,
            min_weight: defaults::DEFAULT_MIN_WEIGHT,
            purpose_modifiers: PurposeModifiers::default(),
        }
    }
}

/// Per-user overrides; unset fields keep the base value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintOverrides {
    /// Override for `deviation_threshold`
    pub deviation_threshold: Option<f64>,
    /// Override for `min_calories_per_window`
    pub min_calories_per_window: Option<f64>,
    /// Override for `max_calories_per_window`
    pub max_calories_per_window: Option<f64>,
    /// Override for `min_protein_retention`
    pub min_protein_retention: Option<f64>,
    /// Override for `max_carbs_per_window_g`
    pub max_carbs_per_window_g: Option<f64>,
    /// Override for `max_fat_per_window_g`
    pub max_fat_per_window_g: Option<f64>,
    /// Override for `bedtime_buffer_hours`
    pub bedtime_buffer_hours: Option<f64>,
    /// Override for `bedtime`
    pub bedtime: Option<NaiveTime>,
    /// Override for `utc_offset_minutes`
    pub utc_offset_minutes: Option<i32>,
}

impl RedistributionConstraints {
    /// Load defaults with environment overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply per-user overrides and re-validate
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden configuration is invalid
    pub fn with_overrides(&self, overrides: &ConstraintOverrides) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        if let Some(value) = overrides.deviation_threshold {
            config.deviation_threshold = value;
        }
        if let Some(value) = overrides.min_calories_per_window {
            config.min_calories_per_window = value;
        }
        if let Some(value) = overrides.max_calories_per_window {
            config.max_calories_per_window = value;
        }
        if let Some(value) = overrides.min_protein_retention {
            config.min_protein_retention = value;
        }
        if let Some(value) = overrides.max_carbs_per_window_g {
            config.max_carbs_per_window_g = value;
        }
        if let Some(value) = overrides.max_fat_per_window_g {
            config.max_fat_per_window_g = value;
        }
        if let Some(value) = overrides.bedtime_buffer_hours {
            config.bedtime_buffer_hours = value;
        }
        if let Some(value) = overrides.bedtime {
            config.bedtime = value;
        }
        if let Some(value) = overrides.utc_offset_minutes {
            config.utc_offset_minutes = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate ranges and orderings
    ///
    /// # Errors
    ///
    /// Returns the first violated rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            self.deviation_threshold,
            self.min_calories_per_window,
            self.max_calories_per_window,
            self.min_protein_retention,
            self.max_carbs_per_window_g,
            self.max_fat_per_window_g,
            self.bedtime_buffer_hours,
            self.min_weight,
        ];
        if scalars
            .iter()
            .chain(self.purpose_modifiers.all().iter())
            .any(|value| !value.is_finite())
        {
            return Err(ConfigError::ValueOutOfRange(
                "numeric constraints must be finite",
            ));
        }
        if !(self.deviation_threshold > 0.0 && self.deviation_threshold < 1.0) {
            return Err(ConfigError::ValueOutOfRange(
                "deviation_threshold must be between 0 and 1 (exclusive)",
            ));
        }
        if self.min_calories_per_window < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_calories_per_window must be non-negative",
            ));
        }
        if self.min_calories_per_window >= self.max_calories_per_window {
            return Err(ConfigError::InvalidRange(
                "min_calories_per_window must be < max_calories_per_window",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_protein_retention) {
            return Err(ConfigError::ValueOutOfRange(
                "min_protein_retention must be between 0 and 1",
            ));
        }
        if self.max_carbs_per_window_g <= 0.0 || self.max_fat_per_window_g <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "per-window carb and fat caps must be positive",
            ));
        }
        if !(0.0..=12.0).contains(&self.bedtime_buffer_hours) {
            return Err(ConfigError::ValueOutOfRange(
                "bedtime_buffer_hours must be between 0 and 12",
            ));
        }
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::ValueOutOfRange(
                "utc_offset_minutes must be within +/- 14 hours",
            ));
        }
        if self.imminent_window_minutes < 0 || self.timing_tolerance_minutes < 0 {
            return Err(ConfigError::ValueOutOfRange(
                "imminent and timing tolerances must be non-negative",
            ));
        }
        if !(self.min_weight > 0.0 && self.min_weight <= 1.0) {
            return Err(ConfigError::ValueOutOfRange(
                "min_weight must be in (0, 1]",
            ));
        }
        if self.purpose_modifiers.all().iter().any(|m| *m <= 0.0) {
            return Err(ConfigError::ValueOutOfRange(
                "purpose modifiers must be positive",
            ));
        }
        Ok(())
    }

    /// Bedtime buffer as a duration
    #[must_use]
    pub fn bedtime_buffer(&self) -> Duration {
        Duration::minutes((self.bedtime_buffer_hours * 60.0).round() as i64)
    }

    /// Imminent-window exemption as a duration
    #[must_use]
    pub fn imminent_window(&self) -> Duration {
        Duration::minutes(self.imminent_window_minutes)
    }

    /// Early/late tolerance as a duration
    #[must_use]
    pub fn timing_tolerance(&self) -> Duration {
        Duration::minutes(self.timing_tolerance_minutes)
    }

    /// Offset of the user's wall clock from UTC
    #[must_use]
    pub fn utc_offset(&self) -> Duration {
        Duration::minutes(i64::from(self.utc_offset_minutes))
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_DEVIATION_THRESHOLD",
            &mut self.deviation_threshold,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_MIN_CALORIES",
            &mut self.min_calories_per_window,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_MAX_CALORIES",
            &mut self.max_calories_per_window,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_PROTEIN_RETENTION",
            &mut self.min_protein_retention,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_MAX_CARBS_G",
            &mut self.max_carbs_per_window_g,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_MAX_FAT_G",
            &mut self.max_fat_per_window_g,
        )?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_BEDTIME_BUFFER_HOURS",
            &mut self.bedtime_buffer_hours,
        )?;
        Self::apply_env_var("PIERRE_REDISTRIBUTION_BEDTIME", &mut self.bedtime)?;
        Self::apply_env_var(
            "PIERRE_REDISTRIBUTION_UTC_OFFSET_MINUTES",
            &mut self.utc_offset_minutes,
        )?;
        Ok(self)
    }
}
