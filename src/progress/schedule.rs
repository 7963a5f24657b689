//! # Level Threshold Schedule
//!
//! Linear XP schedule: advancing from `level` to `level + 1` costs
//! `base + level * step` points.
//!
//! ## Invariants
//! - `xp_for_level` is positive for every level once the schedule validates
//! - `level_for_xp` is the inverse of the cumulative floor (no hysteresis)

use serde::{Deserialize, Serialize};

use super::errors::{ProgressError, ProgressResult};

/// XP cost of the first level-up
pub const DEFAULT_BASE: u64 = 100;

/// Extra XP each subsequent level-up costs
pub const DEFAULT_STEP: u64 = 20;

/// Linear threshold schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSchedule {
    #[serde(default = "default_base")]
    pub base: u64,

    #[serde(default = "default_step")]
    pub step: u64,
}

fn default_base() -> u64 {
    DEFAULT_BASE
}

fn default_step() -> u64 {
    DEFAULT_STEP
}

impl Default for ThresholdSchedule {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            step: DEFAULT_STEP,
        }
    }
}

impl ThresholdSchedule {
    pub fn new(base: u64, step: u64) -> Self {
        Self { base, step }
    }

    /// Reject schedules that could produce a zero threshold.
    ///
    /// Must run at startup; request paths assume a validated schedule.
    pub fn validate(&self) -> ProgressResult<()> {
        if self.base == 0 {
            return Err(ProgressError::Configuration(
                "threshold base must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// XP required to advance from `level` to `level + 1`
    pub fn xp_for_level(&self, level: u32) -> u64 {
        self.base
            .saturating_add(self.step.saturating_mul(u64::from(level)))
    }

    /// Cumulative XP required to reach `level` from zero
    pub fn xp_floor(&self, level: u32) -> u64 {
        let level = u128::from(level);
        let linear = level * u128::from(self.base);
        let triangular = u128::from(self.step) * level * level.saturating_sub(1) / 2;
        u64::try_from(linear + triangular).unwrap_or(u64::MAX)
    }

    /// Highest level whose floor does not exceed `xp`
    pub fn level_for_xp(&self, xp: i64) -> u32 {
        let Ok(xp) = u64::try_from(xp) else {
            return 0;
        };
        if self.base == 0 {
            return 0;
        }

        // Every level costs at least `base`, which bounds the search.
        let upper = (xp / self.base).saturating_add(1).min(u64::from(u32::MAX));
        let (mut low, mut high) = (0u64, upper);
        while low < high {
            let mid = low + (high - low + 1) / 2;
            if self.xp_floor(mid as u32) <= xp {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low as u32
    }
}
