// ABOUTME: Domain service layer for meal window redistribution
// ABOUTME: Orchestrator lifecycle, per-day registry and window storage collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Stateful coordination around the pure redistribution engine. Services own
//! the proposal lifecycle and talk to storage through the [`WindowCommitter`]
//! trait so the engine itself stays free of I/O.

/// One orchestrator per user day
pub mod day_registry;

/// Propose/accept/reject lifecycle for redistribution results
pub mod redistribution;

/// Commit collaborator trait and in-memory window store
pub mod window_store;

pub use day_registry::OrchestratorRegistry;
pub use redistribution::{
    EvaluationOutcome, PendingConflictPolicy, PendingRedistribution, RedistributionOrchestrator,
    RedistributionPhase,
};
pub use window_store::{InMemoryWindowStore, WindowCommitter};
