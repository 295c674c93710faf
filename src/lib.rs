// ABOUTME: Main library entry point for Pierre meal window redistribution
// ABOUTME: Wires the pure engine to the stateful orchestrator, storage collaborators and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Meal Windows
//!
//! Tracks food intake against time-boxed nutrition targets ("meal windows") and
//! reacts when a user overeats, undereats or skips a window by redistributing
//! the remaining windows' macro targets.
//!
//! ## Architecture
//!
//! - **Models** (`pierre-core`): macro targets, meal windows, logged meals
//! - **Intelligence** (`pierre-intelligence`): constraint policy, trigger
//!   evaluator and the pure redistribution engine
//! - **Services**: per-day orchestrator owning the propose/accept/reject
//!   lifecycle, and the window storage collaborators
//! - **Plan**: JSON day plan snapshots
//!
//! Data flows one way: meal logged or window expired, trigger evaluator,
//! redistribution engine, orchestrator (pending result), commit collaborator.

/// Unified error handling re-exported from `pierre-core`
pub use pierre_core::errors;

/// Constants re-exported from `pierre-core`
pub use pierre_core::constants;

/// Data models re-exported from `pierre-core`
pub use pierre_core::models;

/// Constraint policy and redistribution engine re-exported from `pierre-intelligence`
pub use pierre_intelligence as intelligence;

/// Structured logging setup
pub mod logging;

/// Day plan snapshots
pub mod plan;

/// Redistribution orchestration and window storage
pub mod services;
