// ABOUTME: Temporal eligibility and proximity weighting for redistribution candidates
// ABOUTME: Bedtime placement, bedtime-buffer filtering and normalized purpose-aware weights
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Proximity weighting
//!
//! `span` runs from the earliest candidate start to the latest candidate end,
//! and each candidate's lead is measured from that same earliest start. Raw
//! weight is `1 - lead / span`, so the nearest candidate gets 1.0 and the
//! farthest gets its own duration over the span. The raw weight is multiplied
//! by the purpose modifier, floored at `min_weight`, and the set is
//! renormalized to sum to 1.0.

use crate::config::intelligence::RedistributionConstraints;
use chrono::{DateTime, Duration, Utc};
use pierre_core::models::{MealWindow, WindowFlexibility};

/// Next bedtime at or after `now`, expressed in UTC
///
/// Bedtime is a local wall-clock time; `utc_offset_minutes` places it on the
/// user's day. A bedtime that has already passed today rolls to tomorrow.
#[must_use]
pub fn bedtime_boundary(
    now: DateTime<Utc>,
    constraints: &RedistributionConstraints,
) -> DateTime<Utc> {
    let offset = constraints.utc_offset();
    let local_now = now.naive_utc() + offset;
    let mut local_bedtime = local_now.date().and_time(constraints.bedtime);
    if local_bedtime <= local_now {
        local_bedtime += Duration::days(1);
    }
    (local_bedtime - offset).and_utc()
}

/// End of the window, truncated at bedtime
#[must_use]
pub fn effective_end(window: &MealWindow, bedtime: DateTime<Utc>) -> DateTime<Utc> {
    window.end_time.min(bedtime)
}

/// Starts soon enough to be exempt from the bedtime buffer
///
/// Strict windows never receive the exemption.
#[must_use]
pub fn is_imminent(
    window: &MealWindow,
    now: DateTime<Utc>,
    constraints: &RedistributionConstraints,
) -> bool {
    window.flexibility != WindowFlexibility::Strict
        && window.start_time - now <= constraints.imminent_window()
}

/// Whether the window survives the bedtime-buffer filter
#[must_use]
pub fn passes_bedtime_buffer(
    window: &MealWindow,
    now: DateTime<Utc>,
    bedtime: DateTime<Utc>,
    constraints: &RedistributionConstraints,
) -> bool {
    let buffer_start = bedtime - constraints.bedtime_buffer();
    let end = effective_end(window, bedtime);
    let inside_buffer = end >= buffer_start && end <= bedtime;
    !inside_buffer || is_imminent(window, now, constraints)
}

/// Normalized weights, one per candidate, in the same order
///
/// Returns an empty vector for an empty candidate set. Weights are never
/// negative and sum to 1.0.
#[must_use]
pub fn compute_weights(
    candidates: &[&MealWindow],
    constraints: &RedistributionConstraints,
) -> Vec<f64> {
    let (Some(first_start), Some(last_end)) = (
        candidates.iter().map(|w| w.start_time).min(),
        candidates.iter().map(|w| w.end_time).max(),
    ) else {
        return Vec::new();
    };

    let span_seconds = (last_end - first_start).num_seconds() as f64;

    let floored: Vec<f64> = candidates
        .iter()
        .map(|window| {
            let proximity = if span_seconds > 0.0 {
                let lead_seconds = (window.start_time - first_start).num_seconds() as f64;
                (1.0 - lead_seconds / span_seconds).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let modifier = constraints
                .purpose_modifiers
                .for_purpose(window.purpose);
            (proximity * modifier).max(constraints.min_weight)
        })
        .collect();

    let total: f64 = floored.iter().sum();
    floored.iter().map(|weight| weight / total).collect()
}
