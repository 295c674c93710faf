// ABOUTME: Registry handing out one redistribution orchestrator per user and day
// ABOUTME: Concurrent map keyed by (user id, date) with per-user constraint overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::redistribution::{PendingConflictPolicy, RedistributionOrchestrator};
use super::window_store::WindowCommitter;
use chrono::NaiveDate;
use dashmap::DashMap;
use pierre_core::errors::{AppError, AppResult};
use pierre_intelligence::config::{ConstraintOverrides, RedistributionConstraints};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Active day key
pub type DayKey = (Uuid, NaiveDate);

/// Shared orchestrators for every active user day
pub struct OrchestratorRegistry {
    base_constraints: RedistributionConstraints,
    committer: Arc<dyn WindowCommitter>,
    conflict_policy: PendingConflictPolicy,
    user_overrides: DashMap<Uuid, ConstraintOverrides>,
    orchestrators: DashMap<DayKey, Arc<RedistributionOrchestrator>>,
}

impl OrchestratorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(
        base_constraints: RedistributionConstraints,
        committer: Arc<dyn WindowCommitter>,
    ) -> Self {
        Self {
            base_constraints,
            committer,
            conflict_policy: PendingConflictPolicy::default(),
            user_overrides: DashMap::new(),
            orchestrators: DashMap::new(),
        }
    }

    /// Builder-style conflict policy for orchestrators created from now on
    #[must_use]
    pub const fn with_conflict_policy(mut self, policy: PendingConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Register per-user constraint overrides
    ///
    /// Applies to days created after the call; existing days keep their policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides produce an invalid policy
    pub fn set_user_overrides(
        &self,
        user_id: Uuid,
        overrides: ConstraintOverrides,
    ) -> AppResult<()> {
        self.base_constraints
            .with_overrides(&overrides)
            .map_err(|e| AppError::from(e).with_user_id(user_id))?;
        self.user_overrides.insert(user_id, overrides);
        Ok(())
    }

    /// Effective constraints for a user
    ///
    /// # Errors
    ///
    /// Returns an error if stored overrides no longer validate
    pub fn constraints_for(&self, user_id: Uuid) -> AppResult<RedistributionConstraints> {
        match self.user_overrides.get(&user_id) {
            Some(overrides) => self
                .base_constraints
                .with_overrides(overrides.value())
                .map_err(|e| AppError::from(e).with_user_id(user_id)),
            None => Ok(self.base_constraints.clone()),
        }
    }

    /// Orchestrator for a user day, created on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the user's constraints are invalid
    pub fn for_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Arc<RedistributionOrchestrator>> {
        if let Some(existing) = self.orchestrators.get(&(user_id, date)) {
            return Ok(Arc::clone(existing.value()));
        }
        let constraints = self.constraints_for(user_id)?;
        let orchestrator = self
            .orchestrators
            .entry((user_id, date))
            .or_insert_with(|| {
                debug!(%user_id, %date, "Creating redistribution orchestrator");
                Arc::new(
                    RedistributionOrchestrator::new(constraints, Arc::clone(&self.committer))
                        .with_conflict_policy(self.conflict_policy),
                )
            });
        Ok(Arc::clone(orchestrator.value()))
    }

    /// Orchestrator for a user day, if one exists
    #[must_use]
    pub fn get(&self, user_id: Uuid, date: NaiveDate) -> Option<Arc<RedistributionOrchestrator>> {
        self.orchestrators
            .get(&(user_id, date))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop orchestrators for days before `date`, returning how many were removed
    pub fn evict_before(&self, date: NaiveDate) -> usize {
        let before = self.orchestrators.len();
        self.orchestrators.retain(|(_, day), _| *day >= date);
        before.saturating_sub(self.orchestrators.len())
    }

    /// Number of active days
    #[must_use]
    pub fn len(&self) -> usize {
        self.orchestrators.len()
    }

    /// No active days
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orchestrators.is_empty()
    }
}
