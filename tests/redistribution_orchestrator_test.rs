// ABOUTME: Integration tests for the redistribution orchestrator and per-day registry
// ABOUTME: Propose/accept/reject lifecycle, commit failures, conflicts and missed-window sweeps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::NaiveDate;
use common::{
    approx, at, init_test_logging, meal_in, standard_day, standard_targets, store_for,
    trigger_targets, window, FlakyCommitter,
};
use pierre_meal_windows::errors::ErrorCode;
use pierre_meal_windows::intelligence::redistribution::{ResultExplanation, TriggerType};
use pierre_meal_windows::intelligence::{ConstraintOverrides, RedistributionConstraints};
use pierre_meal_windows::models::{MacroTargets, MealWindow, WindowPurpose};
use pierre_meal_windows::services::{
    EvaluationOutcome, OrchestratorRegistry, PendingConflictPolicy, PendingRedistribution,
    RedistributionOrchestrator, RedistributionPhase,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

fn over_meal(windows: &[MealWindow]) -> pierre_meal_windows::models::LoggedMeal {
    meal_in(&windows[0], MacroTargets::new(60.0, 75.0, 22.5))
}

fn expect_proposed(outcome: EvaluationOutcome) -> PendingRedistribution {
    match outcome {
        EvaluationOutcome::Proposed { pending } => pending,
        other => panic!("expected a proposal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_meal_over_threshold_produces_proposal() {
    init_test_logging();
    let windows = standard_day();
    let store = store_for(&windows);
    let orchestrator = RedistributionOrchestrator::new(RedistributionConstraints::default(), store);

    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);

    let outcome = orchestrator
        .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
        .await
        .unwrap();
    let pending = expect_proposed(outcome);

    assert_eq!(pending.result.trigger_window_id, windows[0].id);
    assert_eq!(
        pending.result.trigger_type,
        TriggerType::Overconsumption { percent: 50 }
    );
    assert_eq!(pending.proposed_at, at(8, 0));
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Proposed);
    assert_eq!(orchestrator.pending().await, Some(pending));
}

#[tokio::test]
async fn test_meal_within_threshold_does_not_trigger() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));
    let meal = meal_in(&windows[0], windows[0].target_macros);

    let outcome = orchestrator
        .handle_meal_logged(&meal, &windows, at(8, 0))
        .await
        .unwrap();

    assert_eq!(outcome, EvaluationOutcome::NoTrigger);
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
}

#[tokio::test]
async fn test_meal_for_unknown_window_is_not_found() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));
    let mut meal = over_meal(&windows);
    meal.window_id = Uuid::new_v4();

    let error = orchestrator
        .handle_meal_logged(&meal, &windows, at(8, 0))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_trigger_without_upcoming_windows_stays_idle() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));
    // Logged late in the evening, every other window has started
    let last = windows.len() - 1;
    let meal = meal_in(&windows[last], windows[last].target_macros.scale(2.0));

    let outcome = orchestrator
        .handle_meal_logged(&meal, &windows, at(19, 30))
        .await
        .unwrap();

    match outcome {
        EvaluationOutcome::NoAdjustment { result } => {
            assert!(result.is_empty());
            assert_eq!(result.explanation, Some(ResultExplanation::NoUpcomingWindows));
        }
        other => panic!("expected no adjustment, got {other:?}"),
    }
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
}

#[tokio::test]
async fn test_accept_commits_adjusted_targets() {
    let windows = standard_day();
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    let pending = expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );

    let applied = orchestrator.accept(pending.proposal_id).await.unwrap();

    assert_eq!(applied, pending.result);
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
    assert!(orchestrator.pending().await.is_none());
    for adjusted in &applied.adjusted_windows {
        let stored = store.get(adjusted.window_id).unwrap();
        assert_eq!(stored.target_macros, adjusted.adjusted_macros);
    }
    // Windows outside the result keep their targets
    let dinner = store.get(windows[4].id).unwrap();
    assert_eq!(dinner.target_macros, windows[4].target_macros);
}

#[tokio::test]
async fn test_reject_discards_without_side_effects() {
    let windows = standard_day();
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    let pending = expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );

    orchestrator.reject(pending.proposal_id).await.unwrap();

    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
    assert_eq!(store.snapshot(), windows);

    let error = orchestrator.accept(pending.proposal_id).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidState);
}

#[tokio::test]
async fn test_accept_with_wrong_id_is_not_found() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));
    expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );

    let error = orchestrator.accept(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Proposed);
}

#[tokio::test]
async fn test_failed_commit_keeps_proposal_for_retry() {
    let windows = standard_day();
    let committer = Arc::new(FlakyCommitter::failing());
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), committer.clone());

    let pending = expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );

    let error = orchestrator.accept(pending.proposal_id).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::StorageError);
    assert!(error.code.is_retryable());
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Proposed);
    assert_eq!(orchestrator.pending().await, Some(pending.clone()));

    committer.recover();
    orchestrator.accept(pending.proposal_id).await.unwrap();

    assert_eq!(committer.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(committer.committed.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
}

#[tokio::test]
async fn test_new_trigger_is_deferred_while_proposal_pending() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));

    let first = expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );

    let outcome = orchestrator
        .handle_window_missed(windows[1].id, &windows, at(10, 0))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        EvaluationOutcome::Deferred {
            pending_proposal_id: first.proposal_id
        }
    );
    assert_eq!(orchestrator.pending().await, Some(first));
}

#[tokio::test]
async fn test_supersede_policy_replaces_pending_proposal() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows))
            .with_conflict_policy(PendingConflictPolicy::Supersede);

    let first = expect_proposed(
        orchestrator
            .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
            .await
            .unwrap(),
    );
    let second = expect_proposed(
        orchestrator
            .handle_window_missed(windows[1].id, &windows, at(10, 0))
            .await
            .unwrap(),
    );

    assert_ne!(first.proposal_id, second.proposal_id);
    assert_eq!(second.result.trigger_type, TriggerType::MissedWindow);
    assert_eq!(orchestrator.pending().await, Some(second.clone()));

    let error = orchestrator.accept(first.proposal_id).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
    orchestrator.accept(second.proposal_id).await.unwrap();
}

#[tokio::test]
async fn test_window_not_yet_ended_is_not_missed() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));

    let outcome = orchestrator
        .handle_window_missed(windows[1].id, &windows, at(9, 30))
        .await
        .unwrap();

    assert_eq!(outcome, EvaluationOutcome::NoTrigger);
}

#[tokio::test]
async fn test_sweep_proposes_for_earliest_missed_window() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));

    // Breakfast and the snack have both ended with nothing logged
    let pending = expect_proposed(
        orchestrator
            .sweep_missed_windows(&windows, at(11, 0))
            .await
            .unwrap(),
    );

    assert_eq!(pending.result.trigger_window_id, windows[0].id);
    assert_eq!(pending.result.trigger_type, TriggerType::MissedWindow);
    assert!(pending.result.adjustment_for(windows[1].id).is_none());
    assert!(pending.result.adjustment_for(windows[2].id).is_some());
}

#[tokio::test]
async fn test_sweep_with_nothing_missed_reports_no_trigger() {
    let windows = standard_day();
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store_for(&windows));

    let outcome = orchestrator
        .sweep_missed_windows(&windows, at(6, 0))
        .await
        .unwrap();

    assert_eq!(outcome, EvaluationOutcome::NoTrigger);
}

#[tokio::test]
async fn test_concurrent_triggers_leave_single_proposal() {
    let windows = Arc::new(standard_day());
    let orchestrator = Arc::new(RedistributionOrchestrator::new(
        RedistributionConstraints::default(),
        store_for(&windows),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            let windows = Arc::clone(&windows);
            tokio::spawn(async move {
                orchestrator
                    .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut proposed = 0;
    let mut deferred = 0;
    for handle in handles {
        match handle.await.unwrap() {
            EvaluationOutcome::Proposed { .. } => proposed += 1,
            EvaluationOutcome::Deferred { .. } => deferred += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(proposed, 1);
    assert_eq!(deferred, 7);
}

#[tokio::test]
async fn test_registry_shares_orchestrator_per_user_day() {
    let windows = standard_day();
    let registry =
        OrchestratorRegistry::new(RedistributionConstraints::default(), store_for(&windows));
    let user = Uuid::new_v4();
    let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    assert!(registry.is_empty());
    let first = registry.for_day(user, today).unwrap();
    let again = registry.for_day(user, today).unwrap();
    let next_day = registry.for_day(user, tomorrow).unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &next_day));
    assert_eq!(registry.len(), 2);
    assert!(registry.get(Uuid::new_v4(), today).is_none());

    assert_eq!(registry.evict_before(tomorrow), 1);
    assert!(registry.get(user, today).is_none());
    assert!(registry.get(user, tomorrow).is_some());
}

#[tokio::test]
async fn test_registry_applies_user_overrides() {
    let windows = standard_day();
    let registry =
        OrchestratorRegistry::new(RedistributionConstraints::default(), store_for(&windows));
    let user = Uuid::new_v4();
    let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

    let overrides = ConstraintOverrides {
        deviation_threshold: Some(0.6),
        ..ConstraintOverrides::default()
    };
    registry.set_user_overrides(user, overrides).unwrap();

    let orchestrator = registry.for_day(user, today).unwrap();
    assert!((orchestrator.constraints().deviation_threshold - 0.6).abs() < f64::EPSILON);

    // 50% over no longer crosses the raised threshold
    let outcome = orchestrator
        .handle_meal_logged(&over_meal(&windows), &windows, at(8, 0))
        .await
        .unwrap();
    assert_eq!(outcome, EvaluationOutcome::NoTrigger);

    let invalid = ConstraintOverrides {
        min_protein_retention: Some(1.5),
        ..ConstraintOverrides::default()
    };
    let error = registry.set_user_overrides(user, invalid).unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    let constraints = registry.constraints_for(user).unwrap();
    assert!((constraints.deviation_threshold - 0.6).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_accepted_missed_window_is_not_redistributed_again() {
    init_test_logging();
    let breakfast_targets = MacroTargets::new(15.0, 20.0, 5.0);
    let windows = vec![
        window("breakfast", 7, 8, WindowPurpose::SustainedEnergy, breakfast_targets),
        window("lunch", 12, 13, WindowPurpose::SustainedEnergy, standard_targets()),
    ];
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    let first = expect_proposed(
        orchestrator
            .sweep_missed_windows(&store.snapshot(), at(9, 0))
            .await
            .unwrap(),
    );
    orchestrator.accept(first.proposal_id).await.unwrap();

    let lunch = store.get(windows[1].id).unwrap().target_macros;
    assert!(approx(
        lunch.calories(),
        standard_targets().calories() + breakfast_targets.calories(),
        1e-9
    ));
    assert_eq!(
        orchestrator.settled_deviation(windows[0].id).await,
        Some(MacroTargets::new(-15.0, -20.0, -5.0))
    );

    let swept = orchestrator
        .sweep_missed_windows(&store.snapshot(), at(9, 30))
        .await
        .unwrap();
    let direct = orchestrator
        .handle_window_missed(windows[0].id, &store.snapshot(), at(10, 0))
        .await
        .unwrap();

    assert_eq!(swept, EvaluationOutcome::NoTrigger);
    assert_eq!(direct, EvaluationOutcome::NoTrigger);
    assert_eq!(store.get(windows[1].id).unwrap().target_macros, lunch);
    assert_eq!(orchestrator.phase().await, RedistributionPhase::Idle);
}

#[tokio::test]
async fn test_rejected_missed_window_is_skipped_by_later_sweeps() {
    let windows = standard_day();
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    // Breakfast and the snack have both ended with nothing logged
    let first = expect_proposed(
        orchestrator
            .sweep_missed_windows(&windows, at(11, 0))
            .await
            .unwrap(),
    );
    assert_eq!(first.result.trigger_window_id, windows[0].id);
    orchestrator.reject(first.proposal_id).await.unwrap();

    let second = expect_proposed(
        orchestrator
            .sweep_missed_windows(&windows, at(11, 30))
            .await
            .unwrap(),
    );

    assert_eq!(second.result.trigger_window_id, windows[1].id);
    assert_eq!(store.snapshot(), windows);
}

#[tokio::test]
async fn test_repeat_meal_redistributes_only_the_new_excess() {
    let roomy = MacroTargets::new(80.0, 80.0, 25.0);
    let windows = vec![
        window("breakfast", 7, 8, WindowPurpose::SustainedEnergy, trigger_targets()),
        window("snack", 9, 10, WindowPurpose::SustainedEnergy, roomy),
        window("lunch", 13, 14, WindowPurpose::SustainedEnergy, roomy),
    ];
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    let first_meal = over_meal(&windows);
    let first = expect_proposed(
        orchestrator
            .handle_meal_logged(&first_meal, &store.snapshot(), at(8, 0))
            .await
            .unwrap(),
    );
    store.record_meal(&first_meal).unwrap();
    orchestrator.accept(first.proposal_id).await.unwrap();
    assert!(approx(first.result.net_calorie_change(), -247.5, 1e-6));

    // 160 kcal of extra carbs on top of the already settled 247.5 kcal excess
    let second_meal = meal_in(&windows[0], MacroTargets::new(0.0, 40.0, 0.0));
    let second = expect_proposed(
        orchestrator
            .handle_meal_logged(&second_meal, &store.snapshot(), at(8, 0))
            .await
            .unwrap(),
    );

    assert_eq!(
        second.result.trigger_type,
        TriggerType::Overconsumption { percent: 32 }
    );
    assert!(approx(second.result.net_calorie_change(), -160.0, 1e-6));
    assert!(approx(second.result.total_redistributed.carbs_g, 40.0, 1e-6));
    assert!(approx(second.result.total_redistributed.protein_g, 0.0, 1e-9));
    assert!(approx(second.result.total_redistributed.fat_g, 0.0, 1e-9));

    store.record_meal(&second_meal).unwrap();
    orchestrator.accept(second.proposal_id).await.unwrap();
    assert_eq!(
        orchestrator.settled_deviation(windows[0].id).await,
        Some(MacroTargets::new(20.0, 65.0, 7.5))
    );
}

#[tokio::test]
async fn test_small_repeat_meal_after_settlement_does_not_trigger() {
    let windows = standard_day();
    let store = store_for(&windows);
    let orchestrator =
        RedistributionOrchestrator::new(RedistributionConstraints::default(), store.clone());

    let first_meal = over_meal(&windows);
    let first = expect_proposed(
        orchestrator
            .handle_meal_logged(&first_meal, &store.snapshot(), at(8, 0))
            .await
            .unwrap(),
    );
    store.record_meal(&first_meal).unwrap();
    orchestrator.accept(first.proposal_id).await.unwrap();

    // Cumulatively 58% over, but only 8% beyond what was already settled
    let snack = meal_in(&windows[0], MacroTargets::new(0.0, 10.0, 0.0));
    let outcome = orchestrator
        .handle_meal_logged(&snack, &store.snapshot(), at(8, 0))
        .await
        .unwrap();

    assert_eq!(outcome, EvaluationOutcome::NoTrigger);
}
