// ABOUTME: Configuration module for pierre-intelligence crate
// ABOUTME: Re-exports redistribution constraint configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Intelligence module configuration (redistribution constraints)
pub mod intelligence;

pub use intelligence::{ConfigError, ConstraintOverrides, RedistributionConstraints};
