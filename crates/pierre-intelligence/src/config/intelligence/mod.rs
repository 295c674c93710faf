// ABOUTME: Intelligence configuration for meal window redistribution
// ABOUTME: Organizes constraint policy, purpose modifiers and configuration errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Intelligence Configuration Module
//!
//! Configuration is organized into domain-specific modules:
//! - `redistribution` - thresholds, clamps and purpose modifiers for the engine
//! - `error` - validation and parse errors

pub mod error;
pub mod redistribution;

pub use error::ConfigError;
pub use redistribution::{ConstraintOverrides, PurposeModifiers, RedistributionConstraints};
