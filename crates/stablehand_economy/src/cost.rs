//! # Cost Model
//!
//! Pure pricing for stall unlocks and automation.
//!
//! ```text
//! unlock_cost(0)      = 0                       (first stall is always free)
//! unlock_cost(i > 0)  = round(base * mult^(i-1))
//! automation_cost(i)  = automation_base + i * automation_increment
//! ```
//!
//! A per-stall override replaces the formula entirely. Rounding is
//! round-half-away-from-zero, applied once to the final float; results past
//! `u64::MAX` saturate.
//!
//! The same index and configuration always give the same cost, so the UI can
//! preview prices without touching player state.

use crate::config::{CostConfig, StallDefinition};

/// Both prices for a stall, for UI previews.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostPreview {
    /// Stall index.
    pub index: usize,
    /// Price to unlock.
    pub unlock: u64,
    /// Price to automate.
    pub automation: u64,
}

/// Stateless cost calculator.
#[derive(Clone, Debug)]
pub struct CostModel {
    config: CostConfig,
}

impl CostModel {
    /// Creates a cost model from configuration.
    #[must_use]
    pub const fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this model prices with.
    #[must_use]
    pub const fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Unlock cost for `index`, honoring a definition override.
    #[must_use]
    pub fn unlock_cost(&self, index: usize, definition: Option<&StallDefinition>) -> u64 {
        if let Some(cost) = definition.and_then(|d| d.unlock_cost_override) {
            return cost;
        }
        if index == 0 {
            return 0;
        }
        let scale = i32::try_from(index - 1)
            .map_or(f64::INFINITY, |exp| self.config.unlock_multiplier.powi(exp));
        round_to_coins(self.config.base_unlock_cost as f64 * scale)
    }

    /// Automation cost for `index`, honoring a definition override.
    #[must_use]
    pub fn automation_cost(&self, index: usize, definition: Option<&StallDefinition>) -> u64 {
        if let Some(cost) = definition.and_then(|d| d.automation_cost_override) {
            return cost;
        }
        let step = self
            .config
            .automation_increment_per_index
            .saturating_mul(index as u64);
        self.config.automation_base_cost.saturating_add(step)
    }

    /// Both prices for `index`.
    #[must_use]
    pub fn preview(&self, index: usize, definition: Option<&StallDefinition>) -> CostPreview {
        CostPreview {
            index,
            unlock: self.unlock_cost(index, definition),
            automation: self.automation_cost(index, definition),
        }
    }
}

/// Rounds half away from zero and saturates into `u64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_coins(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // Float-to-int `as` saturates at u64::MAX.
    value.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(base: u64, mult: f64) -> CostModel {
        CostModel::new(CostConfig {
            base_unlock_cost: base,
            unlock_multiplier: mult,
            automation_base_cost: 1000,
            automation_increment_per_index: 500,
        })
    }

    #[test]
    fn test_first_stall_is_free() {
        for (base, mult) in [(100, 2.5), (0, 0.0), (u64::MAX, 1000.0), (7, 1.0)] {
            assert_eq!(model(base, mult).unlock_cost(0, None), 0);
        }
    }

    #[test]
    fn test_unlock_curve() {
        let m = model(100, 2.5);
        assert_eq!(m.unlock_cost(1, None), 100);
        assert_eq!(m.unlock_cost(2, None), 250);
        assert_eq!(m.unlock_cost(3, None), 625);
        // 100 * 2.5^3 = 1562.5 rounds away from zero
        assert_eq!(m.unlock_cost(4, None), 1563);
    }

    #[test]
    fn test_automation_curve() {
        let m = model(100, 2.5);
        assert_eq!(m.automation_cost(0, None), 1000);
        assert_eq!(m.automation_cost(1, None), 1500);
        assert_eq!(m.automation_cost(2, None), 2000);
    }

    #[test]
    fn test_overrides_replace_formula() {
        let m = model(100, 2.5);
        let def = StallDefinition::new(0).with_unlock_cost(50).with_automation_cost(7);
        assert_eq!(m.unlock_cost(0, Some(&def)), 50);
        assert_eq!(m.automation_cost(0, Some(&def)), 7);

        let plain = StallDefinition::new(2);
        assert_eq!(m.unlock_cost(2, Some(&plain)), 250);
    }

    #[test]
    fn test_huge_index_saturates() {
        let m = model(100, 2.5);
        assert_eq!(m.unlock_cost(10_000, None), u64::MAX);
        assert_eq!(m.automation_cost(usize::MAX, None), u64::MAX);
    }

    #[test]
    fn test_costs_are_referentially_transparent() {
        let m = model(100, 2.5);
        let first: Vec<_> = (0..8).map(|i| m.preview(i, None)).collect();
        let second: Vec<_> = (0..8).map(|i| m.preview(i, None)).collect();
        assert_eq!(first, second);
    }
}
