//! # Progression Record
//!
//! The single persisted aggregate of player progression, plus the runtime
//! stall states derived from it.

use serde::{Deserialize, Serialize};

/// Cosmetic selections. Not part of the economy, but saved with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationSelection {
    /// Selected body type index.
    pub body_type: u32,
    /// Selected color palette index.
    pub color_palette: u32,
    /// Selected hat index.
    pub hat: u32,
}

/// Signed-in identity. Not part of the economy, but saved with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Stable player identifier from the sign-in provider.
    pub player_id: Option<String>,
    /// Name shown in the UI.
    pub display_name: Option<String>,
    /// Which provider signed the player in.
    pub auth_provider: Option<String>,
}

/// Everything that survives a restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRecord {
    /// Spendable coins.
    pub coin_balance: u64,
    /// Every coin ever earned. Never decreases.
    pub lifetime_coins_earned: u64,
    /// Stalls `0..stalls_unlocked_count` are unlocked.
    pub stalls_unlocked_count: usize,
    /// `stall_automation_flags[i]` is true when stall `i` is automated.
    pub stall_automation_flags: Vec<bool>,
    /// Cosmetic selections.
    pub customization: CustomizationSelection,
    /// Piles cleaned over the lifetime of the save.
    pub lifetime_piles_cleaned: u64,
    /// Sign-in identity.
    pub identity: PlayerIdentity,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ProgressionRecord {
    /// First-launch record: stall 0 unlocked for free, nothing automated, no coins.
    #[must_use]
    pub fn new(total_stalls: usize) -> Self {
        Self {
            coin_balance: 0,
            lifetime_coins_earned: 0,
            stalls_unlocked_count: total_stalls.min(1),
            stall_automation_flags: vec![false; total_stalls],
            customization: CustomizationSelection::default(),
            lifetime_piles_cleaned: 0,
            identity: PlayerIdentity::default(),
        }
    }

    /// True if stall `index` is unlocked.
    #[must_use]
    pub const fn is_unlocked(&self, index: usize) -> bool {
        index < self.stalls_unlocked_count
    }

    /// True if stall `index` is automated. Out of range is false.
    #[must_use]
    pub fn is_automated(&self, index: usize) -> bool {
        self.stall_automation_flags.get(index).copied().unwrap_or(false)
    }

    /// Derived state of stall `index`, or `None` past the end of the flags.
    #[must_use]
    pub fn stall_state(&self, index: usize) -> Option<StallState> {
        if index >= self.stall_automation_flags.len() {
            return None;
        }
        Some(if self.is_automated(index) {
            StallState::Automated
        } else if self.is_unlocked(index) {
            StallState::Unlocked
        } else {
            StallState::Locked
        })
    }

    /// Reconciles a loaded record with the configured stall count.
    ///
    /// Resizes the automation flags, clamps the unlock count and clears any
    /// automation flag on a locked stall. Returns the repairs made; an empty
    /// list means the record was already consistent.
    pub fn normalize(&mut self, total_stalls: usize) -> Vec<RecordRepair> {
        let mut repairs = Vec::new();

        if self.stall_automation_flags.len() != total_stalls {
            repairs.push(RecordRepair::ResizedFlags {
                from: self.stall_automation_flags.len(),
                to: total_stalls,
            });
            self.stall_automation_flags.resize(total_stalls, false);
        }

        if self.stalls_unlocked_count > total_stalls {
            repairs.push(RecordRepair::ClampedUnlockCount {
                from: self.stalls_unlocked_count,
                to: total_stalls,
            });
            self.stalls_unlocked_count = total_stalls;
        }

        let unlocked = self.stalls_unlocked_count;
        for (index, flag) in self.stall_automation_flags.iter_mut().enumerate() {
            if *flag && index >= unlocked {
                *flag = false;
                repairs.push(RecordRepair::ClearedLockedAutomation { index });
            }
        }

        if self.lifetime_coins_earned < self.coin_balance {
            repairs.push(RecordRepair::RaisedLifetimeEarned {
                from: self.lifetime_coins_earned,
                to: self.coin_balance,
            });
            self.lifetime_coins_earned = self.coin_balance;
        }

        repairs
    }

    /// Checks the record invariants against a stall count.
    #[must_use]
    pub fn is_consistent(&self, total_stalls: usize) -> bool {
        self.stall_automation_flags.len() == total_stalls
            && self.stalls_unlocked_count <= total_stalls
            && self
                .stall_automation_flags
                .iter()
                .enumerate()
                .all(|(i, &automated)| !automated || i < self.stalls_unlocked_count)
    }
}

/// A fix applied by [`ProgressionRecord::normalize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordRepair {
    /// Automation flags had the wrong length.
    ResizedFlags {
        /// Old length.
        from: usize,
        /// New length.
        to: usize,
    },
    /// More stalls unlocked than exist.
    ClampedUnlockCount {
        /// Old count.
        from: usize,
        /// New count.
        to: usize,
    },
    /// A locked stall was flagged as automated.
    ClearedLockedAutomation {
        /// Stall index.
        index: usize,
    },
    /// Lifetime earnings were below the current balance.
    RaisedLifetimeEarned {
        /// Old value.
        from: u64,
        /// New value.
        to: u64,
    },
}

/// Lifecycle state of one stall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StallState {
    /// Not yet purchased.
    Locked,
    /// Purchased; piles need the player.
    Unlocked,
    /// Purchased and automated; piles collect themselves.
    Automated,
}

impl StallState {
    /// True for `Unlocked` and `Automated`.
    #[must_use]
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked | Self::Automated)
    }
}

/// Runtime view of one stall, recomputed from the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StallRuntimeState {
    /// Stall index.
    pub index: usize,
    /// Current state.
    pub state: StallState,
}

impl StallRuntimeState {
    /// True if the stall is unlocked (or automated).
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.state.is_unlocked()
    }

    /// True if the stall is automated.
    #[must_use]
    pub const fn is_automated(&self) -> bool {
        matches!(self.state, StallState::Automated)
    }
}
