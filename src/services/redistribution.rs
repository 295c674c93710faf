// ABOUTME: Redistribution orchestrator owning the propose/accept/reject lifecycle for one user day
// ABOUTME: Routes meal-logged and window-missed events through the evaluator and engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Redistribution orchestration
//!
//! One orchestrator exists per active user day. It is a small state machine:
//!
//! ```text
//! Idle -> Evaluating -> Proposed -> { Applied | Rejected } -> Idle
//! ```
//!
//! At most one result is `Proposed` at a time. The phase and the pending
//! proposal sit behind a single async mutex, so evaluation, accept and reject
//! never interleave for the same day, including across the commit call.
//!
//! When a new trigger fires while a proposal is pending, the configured
//! [`PendingConflictPolicy`] decides what happens. The default keeps the
//! pending proposal and defers the new trigger.
//!
//! Once a proposal for a trigger window is accepted or rejected, that window's
//! deviation counts as settled. A settled missed window is never proposed
//! again, and later meals in a settled window are evaluated only on the
//! deviation they add on top of the settled amount.

use super::window_store::WindowCommitter;
use chrono::{DateTime, Utc};
use pierre_core::errors::{AppError, AppResult};
use pierre_core::models::{LoggedMeal, MacroTargets, MealWindow};
use pierre_intelligence::config::RedistributionConstraints;
use pierre_intelligence::redistribution::{
    RedistributionEngine, RedistributionResult, RedistributionTrigger, TriggerEvaluator,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle phase of a day's redistribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedistributionPhase {
    /// Nothing pending
    #[default]
    Idle,
    /// Engine running for a fresh trigger
    Evaluating,
    /// A result awaits the user's decision
    Proposed,
}

/// What to do when a trigger fires while a proposal is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingConflictPolicy {
    /// Keep the pending proposal; the new trigger is reported as deferred
    #[default]
    RejectNew,
    /// Replace the pending proposal with the newer result
    Supersede,
}

/// A result held for user confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRedistribution {
    /// Handle used to accept or reject
    pub proposal_id: Uuid,
    /// Engine output
    pub result: RedistributionResult,
    /// When the proposal was made
    pub proposed_at: DateTime<Utc>,
}

/// Result of feeding an event to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// The event did not fire a trigger
    NoTrigger,
    /// A trigger fired but the engine had nothing to change
    NoAdjustment {
        /// Empty result with its explanation tag
        result: RedistributionResult,
    },
    /// A new proposal is pending
    Proposed {
        /// The proposal
        pending: PendingRedistribution,
    },
    /// A trigger fired while another proposal was pending and was not evaluated
    Deferred {
        /// Proposal that is still pending
        pending_proposal_id: Uuid,
    },
}

/// Signed `consumed - target` for a trigger window that the pending proposal settles
#[derive(Debug, Clone, Copy)]
struct Settlement {
    window_id: Uuid,
    deviation: MacroTargets,
}

#[derive(Debug, Default)]
struct OrchestratorState {
    phase: RedistributionPhase,
    pending: Option<PendingRedistribution>,
    pending_settlement: Option<Settlement>,
    /// Deviation already accepted or rejected, keyed by trigger window
    settled: HashMap<Uuid, MacroTargets>,
}

impl OrchestratorState {
    fn settle_pending(&mut self) {
        if let Some(settlement) = self.pending_settlement.take() {
            self.settled.insert(settlement.window_id, settlement.deviation);
        }
        self.pending = None;
        self.phase = RedistributionPhase::Idle;
    }
}

/// Stateful coordinator for one user's day
pub struct RedistributionOrchestrator {
    constraints: RedistributionConstraints,
    committer: Arc<dyn WindowCommitter>,
    conflict_policy: PendingConflictPolicy,
    state: Mutex<OrchestratorState>,
}

impl RedistributionOrchestrator {
    /// Create an idle orchestrator
    #[must_use]
    pub fn new(
        constraints: RedistributionConstraints,
        committer: Arc<dyn WindowCommitter>,
    ) -> Self {
        Self {
            constraints,
            committer,
            conflict_policy: PendingConflictPolicy::default(),
            state: Mutex::new(OrchestratorState::default()),
        }
    }

    /// Builder-style conflict policy setter
    #[must_use]
    pub const fn with_conflict_policy(mut self, policy: PendingConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Constraint policy in use
    #[must_use]
    pub const fn constraints(&self) -> &RedistributionConstraints {
        &self.constraints
    }

    /// Current phase
    pub async fn phase(&self) -> RedistributionPhase {
        self.state.lock().await.phase
    }

    /// Pending proposal, if any
    pub async fn pending(&self) -> Option<PendingRedistribution> {
        self.state.lock().await.pending.clone()
    }

    /// Deviation already settled for a trigger window, if any
    pub async fn settled_deviation(&self, window_id: Uuid) -> Option<MacroTargets> {
        self.state.lock().await.settled.get(&window_id).copied()
    }

    /// React to a logged meal
    ///
    /// `windows` is the day's snapshot before the meal was recorded; the meal is
    /// applied to a copy before the engine sees it. When the window already has
    /// a settled deviation, the trigger is evaluated against consumption net of
    /// that amount, so only the newly added deviation is redistributed.
    ///
    /// # Errors
    ///
    /// Returns an error if the meal's window is not part of the snapshot
    pub async fn handle_meal_logged(
        &self,
        meal: &LoggedMeal,
        windows: &[MealWindow],
        now: DateTime<Utc>,
    ) -> AppResult<EvaluationOutcome> {
        let window = find_window(windows, meal.window_id)?;
        let evaluator = TriggerEvaluator::new(&self.constraints);

        let already_settled = self.settled_deviation(window.id).await;
        let baseline = already_settled.map_or_else(
            || window.clone(),
            |settled| MealWindow {
                consumed_macros: window.consumed_macros.subtract(&settled),
                ..window.clone()
            },
        );

        let Some(trigger) = evaluator
            .build_trigger(meal, &baseline, now)
            .or_else(|| evaluator.evaluate_timing(meal, window, now))
        else {
            return Ok(EvaluationOutcome::NoTrigger);
        };
        if let Some(settled) = already_settled {
            debug!(
                window_id = %window.id,
                settled_kcal = settled.calories(),
                "Evaluating meal against settled deviation"
            );
        }

        let snapshot: Vec<MealWindow> = windows
            .iter()
            .map(|w| if w.id == meal.window_id { w.with_meal(meal) } else { w.clone() })
            .collect();

        let settlement = trigger.trigger_type.redistributes().then(|| Settlement {
            window_id: window.id,
            deviation: trigger
                .consumed_macros
                .subtract(&trigger.window.target_macros)
                .add(&already_settled.unwrap_or_default()),
        });

        self.propose(&trigger, &snapshot, settlement, now).await
    }

    /// React to a window that ended with nothing logged
    ///
    /// # Errors
    ///
    /// Returns an error if the window is not part of the snapshot
    pub async fn handle_window_missed(
        &self,
        window_id: Uuid,
        windows: &[MealWindow],
        now: DateTime<Utc>,
    ) -> AppResult<EvaluationOutcome> {
        let window = find_window(windows, window_id)?;
        if self.settled_deviation(window_id).await.is_some() {
            debug!(%window_id, "Missed window already settled");
            return Ok(EvaluationOutcome::NoTrigger);
        }
        let evaluator = TriggerEvaluator::new(&self.constraints);
        let Some(trigger) = evaluator.evaluate_missed_window(window, now) else {
            debug!(%window_id, "Window is not missed");
            return Ok(EvaluationOutcome::NoTrigger);
        };
        let settlement = Settlement {
            window_id,
            deviation: trigger.consumed_macros.subtract(&trigger.window.target_macros),
        };
        self.propose(&trigger, windows, Some(settlement), now).await
    }

    /// Evaluate every missed window, earliest first, until one yields a proposal
    ///
    /// Windows whose deviation is already settled are skipped.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::handle_window_missed`]
    pub async fn sweep_missed_windows(
        &self,
        windows: &[MealWindow],
        now: DateTime<Utc>,
    ) -> AppResult<EvaluationOutcome> {
        let settled: Vec<Uuid> = self.state.lock().await.settled.keys().copied().collect();
        let mut missed: Vec<&MealWindow> = windows
            .iter()
            .filter(|w| w.is_missed(now) && !settled.contains(&w.id))
            .collect();
        missed.sort_by_key(|w| w.end_time);

        let mut last = EvaluationOutcome::NoTrigger;
        for window in missed {
            let outcome = self.handle_window_missed(window.id, windows, now).await?;
            if matches!(
                outcome,
                EvaluationOutcome::Proposed { .. } | EvaluationOutcome::Deferred { .. }
            ) {
                return Ok(outcome);
            }
            last = outcome;
        }
        Ok(last)
    }

    /// Commit the pending proposal and return to `Idle`
    ///
    /// A commit failure leaves the proposal pending so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is pending, the id does not match, or the
    /// committer fails
    pub async fn accept(&self, proposal_id: Uuid) -> AppResult<RedistributionResult> {
        let mut state = self.state.lock().await;
        let pending = matching_pending(&state, proposal_id)?.clone();

        if let Err(error) = self.committer.commit(&pending.result).await {
            warn!(
                %proposal_id,
                error = %error,
                "Commit failed, proposal stays pending"
            );
            return Err(error);
        }

        state.settle_pending();
        info!(
            %proposal_id,
            windows = pending.result.adjusted_windows.len(),
            "Redistribution applied"
        );
        Ok(pending.result)
    }

    /// Discard the pending proposal without side effects
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is pending or the id does not match
    pub async fn reject(&self, proposal_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        matching_pending(&state, proposal_id)?;
        state.settle_pending();
        info!(%proposal_id, "Redistribution rejected");
        Ok(())
    }

    async fn propose(
        &self,
        trigger: &RedistributionTrigger,
        windows: &[MealWindow],
        settlement: Option<Settlement>,
        now: DateTime<Utc>,
    ) -> AppResult<EvaluationOutcome> {
        let mut state = self.state.lock().await;

        if let Some(pending) = &state.pending {
            if self.conflict_policy == PendingConflictPolicy::RejectNew {
                info!(
                    pending_proposal_id = %pending.proposal_id,
                    trigger = trigger.trigger_type.label(),
                    "Trigger deferred while a proposal is pending"
                );
                return Ok(EvaluationOutcome::Deferred {
                    pending_proposal_id: pending.proposal_id,
                });
            }
        }

        let previous_phase = state.phase;
        state.phase = RedistributionPhase::Evaluating;
        let result = RedistributionEngine::calculate_redistribution(
            trigger,
            windows,
            &self.constraints,
            now,
        );

        if result.is_empty() {
            state.phase = previous_phase;
            debug!(
                trigger = trigger.trigger_type.label(),
                explanation = result.explanation.map(|e| e.as_str()),
                "Trigger produced no adjustment"
            );
            return Ok(EvaluationOutcome::NoAdjustment { result });
        }

        if let Some(superseded) = state.pending.take() {
            warn!(
                superseded_proposal_id = %superseded.proposal_id,
                "Pending proposal superseded by newer trigger"
            );
        }

        let pending = PendingRedistribution {
            proposal_id: Uuid::new_v4(),
            result,
            proposed_at: now,
        };
        state.pending = Some(pending.clone());
        state.pending_settlement = settlement;
        state.phase = RedistributionPhase::Proposed;
        info!(
            proposal_id = %pending.proposal_id,
            trigger = trigger.trigger_type.label(),
            windows = pending.result.adjusted_windows.len(),
            confidence = pending.result.confidence_score,
            "Redistribution proposed"
        );
        Ok(EvaluationOutcome::Proposed { pending })
    }
}

fn find_window(windows: &[MealWindow], window_id: Uuid) -> AppResult<&MealWindow> {
    windows.iter().find(|w| w.id == window_id).ok_or_else(|| {
        AppError::not_found(format!("Meal window {window_id}"))
            .with_resource_id(window_id.to_string())
    })
}

fn matching_pending(
    state: &OrchestratorState,
    proposal_id: Uuid,
) -> AppResult<&PendingRedistribution> {
    match &state.pending {
        Some(pending) if pending.proposal_id == proposal_id => Ok(pending),
        Some(_) => Err(AppError::not_found(format!("Proposal {proposal_id}"))
            .with_resource_id(proposal_id.to_string())),
        None => Err(AppError::invalid_state("No redistribution is pending")
            .with_resource_id(proposal_id.to_string())),
    }
}
