// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Energy densities and default redistribution thresholds for meal window planning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped by domain rather than kept in a single flat namespace.
//! Redistribution defaults live here so that both the configuration layer and the
//! tests agree on the same numbers.

/// Energy density of macronutrients (Atwater general factors)
pub mod energy {
    /// Kilocalories per gram of protein
    pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
    /// Kilocalories per gram of carbohydrate
    pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
    /// Kilocalories per gram of fat
    pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
}

/// Default thresholds used by the redistribution engine
pub mod redistribution {
    /// Relative calorie deviation that fires a trigger (25%)
    pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 0.25;
    /// Lower calorie bound for any adjusted window
    pub const DEFAULT_MIN_CALORIES_PER_WINDOW: f64 = 200.0;
    /// Upper calorie bound for any adjusted window
    pub const DEFAULT_MAX_CALORIES_PER_WINDOW: f64 = 1000.0;
    /// Fraction of original protein that must survive a reduction
    pub const DEFAULT_MIN_PROTEIN_RETENTION: f64 = 0.70;
    /// Per-window carbohydrate cap (grams)
    pub const DEFAULT_MAX_CARBS_PER_WINDOW_G: f64 = 150.0;
    /// Per-window fat cap (grams)
    pub const DEFAULT_MAX_FAT_PER_WINDOW_G: f64 = 60.0;
    /// Hours before bedtime during which windows are protected
    pub const DEFAULT_BEDTIME_BUFFER_HOURS: f64 = 3.0;
    /// Default bedtime hour (22:00 local)
    pub const DEFAULT_BEDTIME_HOUR: u32 = 22;
    /// Windows starting within this many minutes are never dropped by the bedtime buffer
    pub const DEFAULT_IMMINENT_WINDOW_MINUTES: i64 = 60;
    /// Minutes a meal may fall outside its window before it counts as early or late
    pub const DEFAULT_TIMING_TOLERANCE_MINUTES: i64 = 30;
    /// No eligible window ever receives less than this raw weight
    pub const DEFAULT_MIN_WEIGHT: f64 = 0.1;
    /// Confidence floor for any non-empty result
    pub const MIN_CONFIDENCE: f64 = 0.5;
    /// Confidence reported when the bedtime buffer removes every candidate
    pub const BEDTIME_BUFFER_CONFIDENCE: f64 = 0.5;
}

/// Purpose modifiers applied on top of proximity weights
pub mod purpose_modifiers {
    /// Pre-workout windows are lightly protected
    pub const PRE_WORKOUT: f64 = 0.8;
    /// Post-workout windows are lightly protected
    pub const POST_WORKOUT: f64 = 0.8;
    /// Sleep-optimization windows are strongly protected
    pub const SLEEP_OPTIMIZATION: f64 = 0.5;
    /// Metabolic-boost windows preferentially absorb change
    pub const METABOLIC_BOOST: f64 = 1.2;
    /// Every other purpose
    pub const NEUTRAL: f64 = 1.0;
}

/// Service identifiers used in structured logs
pub mod service_names {
    /// Name reported by the CLI and logging setup
    pub const PIERRE_MEAL_WINDOWS: &str = "pierre-meal-windows";
}
