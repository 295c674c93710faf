// ABOUTME: Trigger and result types exchanged between evaluator, engine and orchestrator
// ABOUTME: RedistributionTrigger, TriggerType, AdjustedWindow and RedistributionResult
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use pierre_core::models::{MacroTargets, MealWindow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of deviation that fired a trigger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerType {
    /// Ate more than planned, by `percent` of the target
    Overconsumption {
        /// Rounded percentage over target
        percent: u32,
    },
    /// Ate less than planned, by `percent` of the target
    Underconsumption {
        /// Rounded percentage under target
        percent: u32,
    },
    /// Window ended with nothing logged
    MissedWindow,
    /// Meal logged before its window opened
    EarlyConsumption,
    /// Meal logged after its window closed
    LateConsumption,
}

impl TriggerType {
    /// Stable snake_case label for logs and explanations
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Overconsumption { .. } => "overconsumption",
            Self::Underconsumption { .. } => "underconsumption",
            Self::MissedWindow => "missed_window",
            Self::EarlyConsumption => "early_consumption",
            Self::LateConsumption => "late_consumption",
        }
    }

    /// Deviation percentage, when the trigger carries one
    #[must_use]
    pub const fn percent(&self) -> Option<u32> {
        match self {
            Self::Overconsumption { percent } | Self::Underconsumption { percent } => {
                Some(*percent)
            }
            Self::MissedWindow => Some(100),
            Self::EarlyConsumption | Self::LateConsumption => None,
        }
    }

    /// Whether the engine moves macros for this trigger kind
    #[must_use]
    pub const fn redistributes(&self) -> bool {
        matches!(
            self,
            Self::Overconsumption { .. } | Self::Underconsumption { .. } | Self::MissedWindow
        )
    }
}

/// Immutable deviation event handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionTrigger {
    /// Snapshot of the window that caused the trigger
    pub window: MealWindow,
    /// Kind of deviation
    pub trigger_type: TriggerType,
    /// (consumed - target) / target in calories; -1.0 for a missed window
    pub deviation: f64,
    /// Macros actually consumed in the trigger window
    pub consumed_macros: MacroTargets,
    /// When the trigger was evaluated
    pub evaluated_at: DateTime<Utc>,
}

/// Why a window's targets changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Targets reduced to absorb an earlier surplus
    ReducedForOverconsumption,
    /// Targets raised to recover an earlier shortfall
    IncreasedForUnderconsumption,
    /// Targets raised to recover a skipped window
    IncreasedForMissedWindow,
}

/// A constraint that altered the raw allocation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClampKind {
    /// Raised to the per-window calorie minimum
    CalorieFloor,
    /// Lowered to the per-window calorie maximum
    CalorieCeiling,
    /// Protein raised to the retention floor
    ProteinFloor,
    /// Carbohydrates lowered to the per-window cap
    CarbCap,
    /// Fat lowered to the per-window cap
    FatCap,
}

/// Why a result carries no adjustments (or a reduced confidence)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultExplanation {
    /// No future untouched windows remain today
    NoUpcomingWindows,
    /// Every candidate sits inside the protected pre-bedtime range
    BedtimeBuffer,
    /// The trigger implies no macro change
    NoAdjustmentRequired,
}

impl ResultExplanation {
    /// Human-readable tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoUpcomingWindows => "no upcoming windows",
            Self::BedtimeBuffer => "bedtime buffer",
            Self::NoAdjustmentRequired => "no adjustment required",
        }
    }
}

/// New targets proposed for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedWindow {
    /// Window being adjusted
    pub window_id: Uuid,
    /// Targets before redistribution
    pub original_macros: MacroTargets,
    /// Targets after redistribution and clamping
    pub adjusted_macros: MacroTargets,
    /// adjusted calories / original calories
    pub adjustment_ratio: f64,
    /// Normalized share of the delta this window received
    pub weight: f64,
    /// Reason tag
    pub reason: AdjustmentReason,
    /// Constraints that fired, in application order
    pub clamps: Vec<ClampKind>,
}

impl AdjustedWindow {
    /// Signed calorie change
    #[must_use]
    pub fn calorie_delta(&self) -> f64 {
        self.adjusted_macros.calories() - self.original_macros.calories()
    }
}

/// Full output of one engine call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionResult {
    /// Window that fired the trigger
    pub trigger_window_id: Uuid,
    /// Kind of trigger
    pub trigger_type: TriggerType,
    /// Per-window adjustments (empty when nothing changes)
    pub adjusted_windows: Vec<AdjustedWindow>,
    /// How mild the result is, in [0, 1]
    pub confidence_score: f64,
    /// Sum of absolute per-macro differences across all adjusted windows
    pub total_redistributed: MacroTargets,
    /// Set when the result is empty or degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ResultExplanation>,
    /// The `now` the engine was called with
    pub evaluated_at: DateTime<Utc>,
}

impl RedistributionResult {
    /// Well-formed result with no adjustments
    #[must_use]
    pub fn empty(
        trigger: &RedistributionTrigger,
        explanation: ResultExplanation,
        confidence_score: f64,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trigger_window_id: trigger.window.id,
            trigger_type: trigger.trigger_type,
            adjusted_windows: Vec::new(),
            confidence_score,
            total_redistributed: MacroTargets::zero(),
            explanation: Some(explanation),
            evaluated_at,
        }
    }

    /// No window is adjusted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjusted_windows.is_empty()
    }

    /// Adjustment for a given window, if any
    #[must_use]
    pub fn adjustment_for(&self, window_id: Uuid) -> Option<&AdjustedWindow> {
        self.adjusted_windows
            .iter()
            .find(|adjusted| adjusted.window_id == window_id)
    }

    /// Net calorie change across all adjusted windows
    #[must_use]
    pub fn net_calorie_change(&self) -> f64 {
        self.adjusted_windows
            .iter()
            .map(AdjustedWindow::calorie_delta)
            .sum()
    }
}
