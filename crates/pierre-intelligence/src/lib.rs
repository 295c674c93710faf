// ABOUTME: Meal window intelligence - deterministic redistribution of macro targets
// ABOUTME: Extracted from main crate for parallel compilation and modularity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Intelligence
//!
//! Pure algorithms for reacting to deviations from a day's nutrition plan.
//! Nothing in this crate performs I/O or reads the system clock; time is
//! always passed in, which keeps every calculation replayable.
//!
//! ## Modules
//!
//! - **config**: `RedistributionConstraints` and per-user overrides
//! - **redistribution**: trigger evaluation, weighting and the engine

/// Constraint policy configuration
pub mod config;

/// Trigger evaluation and the redistribution engine
pub mod redistribution;

pub use config::{ConfigError, ConstraintOverrides, RedistributionConstraints};
pub use redistribution::{RedistributionEngine, RedistributionResult, TriggerEvaluator};
