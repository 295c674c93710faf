// ABOUTME: Core types and constants for Pierre meal window planning
// ABOUTME: Foundation crate with error handling, macro models and shared constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Core
//!
//! Foundation crate providing shared types and constants for Pierre meal window
//! planning. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Energy densities and default redistribution thresholds
//! - **models**: `MacroTargets`, `MealWindow`, `LoggedMeal`

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (macro targets, meal windows, logged meals)
pub mod models;
