// ABOUTME: Core data models for meal window planning
// ABOUTME: Re-exports MacroTargets, MealWindow and LoggedMeal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Value types shared by the redistribution engine and its collaborators.
//!
//! - `MacroTargets`: protein/carbs/fat grams with derived calories
//! - `MealWindow`: a time-boxed macro target with consumption so far
//! - `LoggedMeal`: a single intake event assigned to a window

mod macros;
mod meal_window;
mod nutrition;

pub use macros::MacroTargets;
pub use meal_window::{MealWindow, WindowFlexibility, WindowPurpose};
pub use nutrition::LoggedMeal;
