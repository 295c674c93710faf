// ABOUTME: Redistribution engine recomputing remaining meal window targets after a deviation
// ABOUTME: Eligibility, bedtime buffer, proximity weighting, allocation, clamping and confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Redistribution Engine
//!
//! `calculate_redistribution(trigger, windows, constraints, now)` is a pure
//! function: it reads an immutable window snapshot and returns a fresh
//! [`RedistributionResult`]. Nothing is mutated, no clock is read, and every
//! "nothing to do" case is an empty but well-formed result.
//!
//! # Pipeline
//!
//! 1. Eligibility: future windows with nothing logged.
//! 2. Delta: overconsumption removes `consumed - target`, underconsumption adds
//!    `target - consumed`, a missed window adds the full target. Other trigger
//!    kinds carry no delta.
//! 3. Bedtime buffer: drop candidates ending inside `[bedtime - buffer, bedtime]`
//!    unless they start within the imminent-window exemption.
//! 4. Proximity weights with purpose modifiers, floored and normalized.
//! 5. Allocation of `delta x weight` per window.
//! 6. Clamping, in order: calorie range, protein floor, carb/fat caps.
//! 7. Confidence from the mean deviation of adjustment ratios from 1.0.
//! 8. Aggregate absolute per-macro change.
//!
//! # Clamp precedence
//!
//! The protein floor is applied after the calorie range and wins over it: an
//! adjusted window always keeps at least `min_protein_retention` of its
//! original protein, even when that pushes calories past the per-window
//! maximum. Carb and fat caps run last and only ever lower calories.

use super::types::{
    AdjustedWindow, AdjustmentReason, ClampKind, RedistributionResult, RedistributionTrigger,
    ResultExplanation, TriggerType,
};
use super::weighting::{bedtime_boundary, compute_weights, passes_bedtime_buffer};
use crate::config::intelligence::RedistributionConstraints;
use chrono::{DateTime, Utc};
use pierre_core::constants::energy::KCAL_PER_GRAM_CARBS;
use pierre_core::constants::redistribution::{BEDTIME_BUFFER_CONFIDENCE, MIN_CONFIDENCE};
use pierre_core::models::{MacroTargets, MealWindow};
use tracing::debug;

/// Direction in which the delta is applied to future windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Remove,
    Add,
}

/// Stateless redistribution engine
pub struct RedistributionEngine;

impl RedistributionEngine {
    /// Recompute targets for the day's remaining windows
    #[must_use]
    pub fn calculate_redistribution(
        trigger: &RedistributionTrigger,
        windows: &[MealWindow],
        constraints: &RedistributionConstraints,
        now: DateTime<Utc>,
    ) -> RedistributionResult {
        let candidates: Vec<&MealWindow> = windows
            .iter()
            .filter(|window| window.id != trigger.window.id && window.is_untouched(now))
            .collect();

        if candidates.is_empty() {
            debug!(
                trigger = trigger.trigger_type.label(),
                "No upcoming windows eligible for redistribution"
            );
            return RedistributionResult::empty(
                trigger,
                ResultExplanation::NoUpcomingWindows,
                0.0,
                now,
            );
        }

        let Some((delta, direction, reason)) = Self::adjustment_delta(trigger) else {
            debug!(
                trigger = trigger.trigger_type.label(),
                "Trigger carries no macro delta"
            );
            return RedistributionResult::empty(
                trigger,
                ResultExplanation::NoAdjustmentRequired,
                0.0,
                now,
            );
        };

        let bedtime = bedtime_boundary(now, constraints);
        let eligible: Vec<&MealWindow> = candidates
            .into_iter()
            .filter(|window| passes_bedtime_buffer(window, now, bedtime, constraints))
            .collect();

        if eligible.is_empty() {
            debug!(%bedtime, "Bedtime buffer excluded every candidate window");
            return RedistributionResult::empty(
                trigger,
                ResultExplanation::BedtimeBuffer,
                BEDTIME_BUFFER_CONFIDENCE,
                now,
            );
        }

        let weights = compute_weights(&eligible, constraints);
        let adjusted_windows: Vec<AdjustedWindow> = eligible
            .iter()
            .zip(weights)
            .map(|(window, weight)| {
                Self::adjust_window(window, &delta, weight, direction, reason, constraints)
            })
            .collect();

        let confidence_score = Self::confidence(&adjusted_windows);
        let total_redistributed = Self::total_redistributed(&adjusted_windows);

        debug!(
            trigger = trigger.trigger_type.label(),
            windows = adjusted_windows.len(),
            confidence_score,
            redistributed_kcal = total_redistributed.calories(),
            "Redistribution calculated"
        );

        RedistributionResult {
            trigger_window_id: trigger.window.id,
            trigger_type: trigger.trigger_type,
            adjusted_windows,
            confidence_score,
            total_redistributed,
            explanation: None,
            evaluated_at: now,
        }
    }

    /// Macro amount to move, its direction and the reason tag
    ///
    /// `None` when the trigger implies no change.
    fn adjustment_delta(
        trigger: &RedistributionTrigger,
    ) -> Option<(MacroTargets, Direction, AdjustmentReason)> {
        let target = trigger.window.target_macros;
        let consumed = trigger.consumed_macros;
        let (delta, direction, reason) = match trigger.trigger_type {
            TriggerType::Overconsumption { .. } => (
                consumed.subtract(&target).floor_at_zero(),
                Direction::Remove,
                AdjustmentReason::ReducedForOverconsumption,
            ),
            TriggerType::Underconsumption { .. } => (
                target.subtract(&consumed).floor_at_zero(),
                Direction::Add,
                AdjustmentReason::IncreasedForUnderconsumption,
            ),
            TriggerType::MissedWindow => (
                target.floor_at_zero(),
                Direction::Add,
                AdjustmentReason::IncreasedForMissedWindow,
            ),
            TriggerType::EarlyConsumption | TriggerType::LateConsumption => return None,
        };
        if delta.is_zero() {
            return None;
        }
        Some((delta, direction, reason))
    }

    fn adjust_window(
        window: &MealWindow,
        delta: &MacroTargets,
        weight: f64,
        direction: Direction,
        reason: AdjustmentReason,
        constraints: &RedistributionConstraints,
    ) -> AdjustedWindow {
        let original = window.target_macros;
        let share = delta.scale(weight);
        let allocated = match direction {
            Direction::Remove => original.subtract(&share),
            Direction::Add => original.add(&share),
        }
        .floor_at_zero();

        let (adjusted_macros, clamps) = Self::apply_constraints(allocated, &original, constraints);

        let original_calories = original.calories();
        let adjustment_ratio = if original_calories > 0.0 {
            adjusted_macros.calories() / original_calories
        } else {
            1.0
        };

        AdjustedWindow {
            window_id: window.id,
            original_macros: original,
            adjusted_macros,
            adjustment_ratio,
            weight,
            reason,
            clamps,
        }
    }

    /// Apply calorie range, protein floor and carb/fat caps in that order
    fn apply_constraints(
        allocated: MacroTargets,
        original: &MacroTargets,
        constraints: &RedistributionConstraints,
    ) -> (MacroTargets, Vec<ClampKind>) {
        let mut clamps = Vec::new();

        let mut macros = Self::clamp_calories(allocated, original, constraints, &mut clamps);

        let protein_floor = original.protein_g * constraints.min_protein_retention;
        if macros.protein_g < protein_floor {
            macros.protein_g = protein_floor;
            clamps.push(ClampKind::ProteinFloor);
        }

        if macros.carbs_g > constraints.max_carbs_per_window_g {
            macros.carbs_g = constraints.max_carbs_per_window_g;
            clamps.push(ClampKind::CarbCap);
        }
        if macros.fat_g > constraints.max_fat_per_window_g {
            macros.fat_g = constraints.max_fat_per_window_g;
            clamps.push(ClampKind::FatCap);
        }

        (macros.floor_at_zero(), clamps)
    }

    /// Scale macros proportionally into the per-window calorie range
    fn clamp_calories(
        macros: MacroTargets,
        original: &MacroTargets,
        constraints: &RedistributionConstraints,
        clamps: &mut Vec<ClampKind>,
    ) -> MacroTargets {
        let calories = macros.calories();
        let min = constraints.min_calories_per_window;
        let max = constraints.max_calories_per_window;

        if calories > max {
            clamps.push(ClampKind::CalorieCeiling);
            return macros.scale(max / calories);
        }
        if calories >= min {
            return macros;
        }

        clamps.push(ClampKind::CalorieFloor);
        if calories > 0.0 {
            return macros.scale(min / calories);
        }
        // Reduced to nothing: rebuild the floor from the original macro mix
        let original_calories = original.calories();
        if original_calories > 0.0 {
            original.scale(min / original_calories)
        } else {
            MacroTargets::new(0.0, min / KCAL_PER_GRAM_CARBS, 0.0)
        }
    }

    /// `max(0.5, min(1.0, 1 - mean|ratio - 1|))`, or 0.0 for no windows
    fn confidence(adjusted: &[AdjustedWindow]) -> f64 {
        if adjusted.is_empty() {
            return 0.0;
        }
        let mean_deviation = adjusted
            .iter()
            .map(|window| (window.adjustment_ratio - 1.0).abs())
            .sum::<f64>()
            / adjusted.len() as f64;
        (1.0 - mean_deviation).clamp(MIN_CONFIDENCE, 1.0)
    }

    fn total_redistributed(adjusted: &[AdjustedWindow]) -> MacroTargets {
        adjusted.iter().fold(MacroTargets::zero(), |total, window| {
            total.add(&window.adjusted_macros.abs_diff(&window.original_macros))
        })
    }
}
