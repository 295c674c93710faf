// ABOUTME: Meal window redistribution - trigger evaluation and target recomputation
// ABOUTME: Re-exports the engine, trigger evaluator, weighting helpers and result types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Redistribution of macro targets across a day's remaining meal windows.
//!
//! Data flows one way: a logged meal or expired window goes through the
//! [`TriggerEvaluator`], a fired trigger goes through the
//! [`RedistributionEngine`], and the resulting [`RedistributionResult`] is
//! handed to a stateful caller that proposes it to the user.

/// Pure redistribution engine
pub mod engine;
/// Deviation detection and trigger construction
pub mod trigger;
/// Trigger and result value types
pub mod types;
/// Bedtime boundary and proximity weights
pub mod weighting;

pub use engine::RedistributionEngine;
pub use trigger::TriggerEvaluator;
pub use types::{
    AdjustedWindow, AdjustmentReason, ClampKind, RedistributionResult, RedistributionTrigger,
    ResultExplanation, TriggerType,
};
