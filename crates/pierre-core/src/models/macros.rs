// ABOUTME: Immutable macronutrient target value type with derived calories
// ABOUTME: Named add/subtract/scale operations replace operator overloading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::energy::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use serde::{Deserialize, Serialize};

/// Protein, carbohydrate and fat amounts in grams
///
/// Calories are always derived (protein·4 + carbs·4 + fat·9) and never stored,
/// so a `MacroTargets` value can't drift out of sync with its energy total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroTargets {
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
}

impl MacroTargets {
    /// Create a macro target from gram amounts
    #[must_use]
    pub const fn new(protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            protein_g,
            carbs_g,
            fat_g,
        }
    }

    /// All macros at zero
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Derived energy in kcal
    #[must_use]
    pub fn calories(&self) -> f64 {
        self.protein_g.mul_add(
            KCAL_PER_GRAM_PROTEIN,
            self.carbs_g
                .mul_add(KCAL_PER_GRAM_CARBS, self.fat_g * KCAL_PER_GRAM_FAT),
        )
    }

    /// True when every macro is exactly zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.protein_g == 0.0 && self.carbs_g == 0.0 && self.fat_g == 0.0
    }

    /// Component-wise sum
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.protein_g + other.protein_g,
            self.carbs_g + other.carbs_g,
            self.fat_g + other.fat_g,
        )
    }

    /// Component-wise difference, may go negative
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        Self::new(
            self.protein_g - other.protein_g,
            self.carbs_g - other.carbs_g,
            self.fat_g - other.fat_g,
        )
    }

    /// Multiply every macro by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(
            self.protein_g * factor,
            self.carbs_g * factor,
            self.fat_g * factor,
        )
    }

    /// Clamp negative components to zero
    #[must_use]
    pub fn floor_at_zero(&self) -> Self {
        Self::new(
            self.protein_g.max(0.0),
            self.carbs_g.max(0.0),
            self.fat_g.max(0.0),
        )
    }

    /// Component-wise absolute difference
    #[must_use]
    pub fn abs_diff(&self, other: &Self) -> Self {
        Self::new(
            (self.protein_g - other.protein_g).abs(),
            (self.carbs_g - other.carbs_g).abs(),
            (self.fat_g - other.fat_g).abs(),
        )
    }

    /// Share of calories coming from each macro as (protein, carbs, fat) fractions
    ///
    /// Returns `None` for a zero-calorie value.
    #[must_use]
    pub fn calorie_shares(&self) -> Option<(f64, f64, f64)> {
        let total = self.calories();
        if total <= 0.0 {
            return None;
        }
        Some((
            self.protein_g * KCAL_PER_GRAM_PROTEIN / total,
            self.carbs_g * KCAL_PER_GRAM_CARBS / total,
            self.fat_g * KCAL_PER_GRAM_FAT / total,
        ))
    }
}
