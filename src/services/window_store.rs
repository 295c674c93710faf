// ABOUTME: Commit collaborator contract and an in-memory meal window store
// ABOUTME: Persists accepted redistribution targets and logged meal consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use dashmap::DashMap;
use pierre_core::errors::{AppError, AppResult};
use pierre_core::models::{LoggedMeal, MealWindow};
use pierre_intelligence::redistribution::RedistributionResult;
use tracing::debug;
use uuid::Uuid;

/// Persists an accepted redistribution back into window storage
///
/// Implementations overwrite each affected window's `target_macros` with the
/// adjusted values. A returned error means nothing was applied and the caller
/// may retry.
#[async_trait]
pub trait WindowCommitter: Send + Sync {
    /// Apply every adjustment in `result`
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable or a window is unknown
    async fn commit(&self, result: &RedistributionResult) -> AppResult<()>;
}

/// Meal windows held in memory, keyed by window id
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: DashMap<Uuid, MealWindow>,
}

impl InMemoryWindowStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `windows`
    #[must_use]
    pub fn with_windows(windows: impl IntoIterator<Item = MealWindow>) -> Self {
        let store = Self::new();
        for window in windows {
            store.windows.insert(window.id, window);
        }
        store
    }

    /// Current state of a window
    #[must_use]
    pub fn get(&self, window_id: Uuid) -> Option<MealWindow> {
        self.windows.get(&window_id).map(|entry| entry.value().clone())
    }

    /// Consistent copy of every window, ordered by start time
    #[must_use]
    pub fn snapshot(&self) -> Vec<MealWindow> {
        let mut windows: Vec<MealWindow> = self
            .windows
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        windows.sort_by_key(|window| window.start_time);
        windows
    }

    /// Add a logged meal to its window's consumption
    ///
    /// # Errors
    ///
    /// Returns an error if the meal's window is unknown
    pub fn record_meal(&self, meal: &LoggedMeal) -> AppResult<MealWindow> {
        let mut entry = self.windows.get_mut(&meal.window_id).ok_or_else(|| {
            AppError::not_found(format!("Meal window {}", meal.window_id))
                .with_resource_id(meal.window_id.to_string())
        })?;
        let updated = entry.with_meal(meal);
        *entry = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl WindowCommitter for InMemoryWindowStore {
    async fn commit(&self, result: &RedistributionResult) -> AppResult<()> {
        // Check every id before writing so a bad result leaves storage untouched
        if let Some(missing) = result
            .adjusted_windows
            .iter()
            .find(|adjusted| !self.windows.contains_key(&adjusted.window_id))
        {
            return Err(AppError::not_found(format!("Meal window {}", missing.window_id))
                .with_resource_id(missing.window_id.to_string()));
        }

        for adjusted in &result.adjusted_windows {
            if let Some(mut window) = self.windows.get_mut(&adjusted.window_id) {
                window.target_macros = adjusted.adjusted_macros;
            }
        }
        debug!(
            windows = result.adjusted_windows.len(),
            "Committed redistribution to in-memory store"
        );
        Ok(())
    }
}
