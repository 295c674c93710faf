// ABOUTME: Trigger evaluator deciding whether a logged meal or missed window fires a redistribution
// ABOUTME: Computes calorie deviation against target and builds RedistributionTrigger values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Trigger Evaluator
//!
//! Deviation is `(consumed - target) / target` in calories. A trigger fires only
//! when `|deviation|` strictly exceeds the configured threshold. A window with a
//! zero-calorie target can never fire; that is a no-op, not an error.
//!
//! Missed windows bypass the threshold: a window that ends with nothing logged
//! always produces `MissedWindow` with deviation `-1.0`.

use super::types::{RedistributionTrigger, TriggerType};
use crate::config::intelligence::RedistributionConstraints;
use chrono::{DateTime, Utc};
use pierre_core::models::{LoggedMeal, MacroTargets, MealWindow};
use tracing::{debug, warn};

/// Decides when deviations become redistribution triggers
#[derive(Debug, Clone, Copy)]
pub struct TriggerEvaluator<'a> {
    constraints: &'a RedistributionConstraints,
}

impl<'a> TriggerEvaluator<'a> {
    /// Create an evaluator bound to a constraint policy
    #[must_use]
    pub const fn new(constraints: &'a RedistributionConstraints) -> Self {
        Self { constraints }
    }

    /// Relative calorie deviation, `None` when the target has no calories
    #[must_use]
    pub fn deviation(consumed: &MacroTargets, target: &MacroTargets) -> Option<f64> {
        let target_calories = target.calories();
        if target_calories <= 0.0 {
            return None;
        }
        Some((consumed.calories() - target_calories) / target_calories)
    }

    /// Rounded absolute percentage for a deviation ratio
    #[must_use]
    pub fn deviation_percent(deviation: f64) -> u32 {
        (deviation.abs() * 100.0).round() as u32
    }

    /// Whether logging `meal` into `window` pushes it past the threshold
    ///
    /// `window` is the snapshot before the meal was recorded.
    #[must_use]
    pub fn evaluate(&self, meal: &LoggedMeal, window: &MealWindow) -> bool {
        let consumed = window.consumed_macros.add(&meal.macros);
        Self::deviation(&consumed, &window.target_macros)
            .is_some_and(|deviation| deviation.abs() > self.constraints.deviation_threshold)
    }

    /// Build an over/underconsumption trigger for a logged meal, if one fires
    #[must_use]
    pub fn build_trigger(
        &self,
        meal: &LoggedMeal,
        window: &MealWindow,
        now: DateTime<Utc>,
    ) -> Option<RedistributionTrigger> {
        if meal.window_id != window.id {
            warn!(
                meal_id = %meal.id,
                meal_window = %meal.window_id,
                window_id = %window.id,
                "Meal evaluated against a window it was not assigned to"
            );
            return None;
        }

        let consumed = window.consumed_macros.add(&meal.macros);
        let Some(deviation) = Self::deviation(&consumed, &window.target_macros) else {
            debug!(window_id = %window.id, "Window has no calorie target, skipping trigger");
            return None;
        };

        if deviation.abs() <= self.constraints.deviation_threshold {
            debug!(
                window_id = %window.id,
                deviation,
                threshold = self.constraints.deviation_threshold,
                "Deviation within threshold"
            );
            return None;
        }

        let percent = Self::deviation_percent(deviation);
        let trigger_type = if deviation > 0.0 {
            TriggerType::Overconsumption { percent }
        } else {
            TriggerType::Underconsumption { percent }
        };

        debug!(
            window_id = %window.id,
            deviation,
            trigger = trigger_type.label(),
            "Deviation trigger fired"
        );

        Some(RedistributionTrigger {
            window: window.with_meal(meal),
            trigger_type,
            deviation,
            consumed_macros: consumed,
            evaluated_at: now,
        })
    }

    /// Missed-window trigger when `window` ended with nothing logged
    #[must_use]
    pub fn evaluate_missed_window(
        &self,
        window: &MealWindow,
        now: DateTime<Utc>,
    ) -> Option<RedistributionTrigger> {
        if !window.is_missed(now) {
            return None;
        }
        debug!(window_id = %window.id, "Missed window trigger fired");
        Some(RedistributionTrigger {
            window: window.clone(),
            trigger_type: TriggerType::MissedWindow,
            deviation: -1.0,
            consumed_macros: MacroTargets::zero(),
            evaluated_at: now,
        })
    }

    /// Early/late consumption trigger when the meal was logged outside its window
    ///
    /// These triggers are informational; the engine treats them as no-ops.
    #[must_use]
    pub fn evaluate_timing(
        &self,
        meal: &LoggedMeal,
        window: &MealWindow,
        now: DateTime<Utc>,
    ) -> Option<RedistributionTrigger> {
        let tolerance = self.constraints.timing_tolerance();
        let trigger_type = if meal.logged_at < window.start_time - tolerance {
            TriggerType::EarlyConsumption
        } else if meal.logged_at >= window.end_time + tolerance {
            TriggerType::LateConsumption
        } else {
            return None;
        };

        let consumed = window.consumed_macros.add(&meal.macros);
        Some(RedistributionTrigger {
            window: window.with_meal(meal),
            trigger_type,
            deviation: Self::deviation(&consumed, &window.target_macros).unwrap_or(0.0),
            consumed_macros: consumed,
            evaluated_at: now,
        })
    }
}
