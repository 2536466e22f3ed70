//! # Stall Lifecycle
//!
//! Per-stall state machine with a global unlock sequence.
//!
//! ```text
//! Locked ──(unlock_next, pays unlock cost)──> Unlocked ──(automate, pays automation cost)──> Automated
//! ```
//!
//! ## Rules
//!
//! - Only the stall at `stalls_unlocked_count` can unlock; one per call.
//! - No reverse transitions, and Unlocked is never skipped.
//! - The debit and the transition are one commit: if the save fails,
//!   neither happened.
//! - Restoring at session start recomputes runtime state from the record.
//!   It spends nothing and emits nothing, so it is safe to repeat.

use std::sync::Arc;

use crate::config::EconomyConfig;
use crate::cost::{CostModel, CostPreview};
use crate::error::{log_rejected, EconomyError, EconomyResult};
use crate::events::{balance_delta, EconomyEvent};
use crate::ledger::debit;
use crate::progression::Progression;
use crate::record::{StallRuntimeState, StallState};

/// Unlock and automation state machine for every stall.
pub struct StallLifecycle {
    progression: Arc<Progression>,
    config: Arc<EconomyConfig>,
    costs: CostModel,
    /// Cached runtime view, refreshed by `restore` and by each transition.
    runtime: Vec<StallRuntimeState>,
}

impl StallLifecycle {
    /// Creates the state machine. Call [`restore`](Self::restore) before use.
    #[must_use]
    pub fn new(progression: Arc<Progression>, config: Arc<EconomyConfig>) -> Self {
        let costs = CostModel::new(config.costs.clone());
        Self {
            progression,
            config,
            costs,
            runtime: Vec::new(),
        }
    }

    /// Number of stalls in the sequence.
    #[must_use]
    pub fn total_stalls(&self) -> usize {
        self.config.total_stalls
    }

    /// The pricing model.
    #[must_use]
    pub const fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// Index of the next stall to unlock, or `None` when all are unlocked.
    #[must_use]
    pub fn next_locked_index(&self) -> Option<usize> {
        let unlocked = self.progression.read(|r| r.stalls_unlocked_count);
        (unlocked < self.total_stalls()).then_some(unlocked)
    }

    /// Unlock price of stall `index`.
    #[must_use]
    pub fn unlock_cost(&self, index: usize) -> u64 {
        self.costs.unlock_cost(index, self.config.definition(index))
    }

    /// Automation price of stall `index`.
    #[must_use]
    pub fn automation_cost(&self, index: usize) -> u64 {
        self.costs.automation_cost(index, self.config.definition(index))
    }

    /// Both prices of stall `index`, or `None` if out of range.
    #[must_use]
    pub fn cost_preview(&self, index: usize) -> Option<CostPreview> {
        (index < self.total_stalls())
            .then(|| self.costs.preview(index, self.config.definition(index)))
    }

    /// Unlocks the next stall in sequence and returns its index.
    ///
    /// # Errors
    ///
    /// `AllStallsUnlocked`, `MissingStallDefinition`, `InsufficientFunds` or
    /// `Persistence`. On any error nothing changed.
    pub fn unlock_next(&mut self) -> EconomyResult<usize> {
        let total = self.total_stalls();
        let config = &self.config;
        let costs = &self.costs;

        let (index, cost, balance) = self.progression.commit(|record| {
            let index = record.stalls_unlocked_count;
            if index >= total {
                return Err(EconomyError::AllStallsUnlocked);
            }
            let definition = config
                .definition(index)
                .ok_or(EconomyError::MissingStallDefinition(index))?;
            let cost = costs.unlock_cost(index, Some(definition));
            if cost > 0 {
                debit(record, cost)?;
            }
            record.stalls_unlocked_count = index + 1;
            Ok((index, cost, record.coin_balance))
        })?;

        self.refresh(index);
        tracing::info!(index, cost, balance, "stall unlocked");

        let events = self.progression.events();
        if cost > 0 {
            events.balance_changed(balance, balance_delta(balance + cost, balance));
        }
        events.send(EconomyEvent::StallUnlocked { index });
        Ok(index)
    }

    /// Unlocks the next stall. Returns `false` with no change if it cannot.
    pub fn try_unlock_next(&mut self) -> bool {
        match self.unlock_next() {
            Ok(_) => true,
            Err(e) => {
                log_rejected("try_unlock_next", &e);
                false
            }
        }
    }

    /// Buys automation for an unlocked stall.
    ///
    /// # Errors
    ///
    /// `StallOutOfRange`, `StallLocked`, `AlreadyAutomated`,
    /// `MissingStallDefinition`, `InsufficientFunds` or `Persistence`.
    /// On any error nothing changed.
    pub fn automate(&mut self, index: usize) -> EconomyResult<()> {
        let total = self.total_stalls();
        if index >= total {
            return Err(EconomyError::StallOutOfRange { index, total });
        }
        let config = &self.config;
        let costs = &self.costs;

        let (cost, balance) = self.progression.commit(|record| {
            if !record.is_unlocked(index) {
                return Err(EconomyError::StallLocked(index));
            }
            if record.is_automated(index) {
                return Err(EconomyError::AlreadyAutomated(index));
            }
            let definition = config
                .definition(index)
                .ok_or(EconomyError::MissingStallDefinition(index))?;
            let cost = costs.automation_cost(index, Some(definition));
            if cost > 0 {
                debit(record, cost)?;
            }
            let flag = record
                .stall_automation_flags
                .get_mut(index)
                .ok_or(EconomyError::StallOutOfRange { index, total })?;
            *flag = true;
            Ok((cost, record.coin_balance))
        })?;

        self.refresh(index);
        tracing::info!(index, cost, balance, "stall automated");

        let events = self.progression.events();
        if cost > 0 {
            events.balance_changed(balance, balance_delta(balance + cost, balance));
        }
        events.send(EconomyEvent::StallAutomated { index });
        Ok(())
    }

    /// Buys automation. Returns `false` with no change if it cannot.
    pub fn try_automate(&mut self, index: usize) -> bool {
        match self.automate(index) {
            Ok(()) => true,
            Err(e) => {
                log_rejected("try_automate", &e);
                false
            }
        }
    }

    /// True if stall `index` is unlocked. Out of range is false.
    #[must_use]
    pub fn is_unlocked(&self, index: usize) -> bool {
        index < self.total_stalls() && self.progression.read(|r| r.is_unlocked(index))
    }

    /// True if stall `index` is automated. Out of range is false.
    #[must_use]
    pub fn is_automated(&self, index: usize) -> bool {
        index < self.total_stalls() && self.progression.read(|r| r.is_automated(index))
    }

    /// Current state of stall `index`, or `None` if out of range.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<StallState> {
        if index >= self.total_stalls() {
            return None;
        }
        self.progression.read(|r| r.stall_state(index))
    }

    /// Rebuilds runtime state for every stall from the committed record.
    ///
    /// Idempotent: no coins move, nothing is saved, no events fire.
    pub fn restore(&mut self) -> &[StallRuntimeState] {
        let total = self.total_stalls();
        self.runtime = self.progression.read(|record| {
            (0..total)
                .map(|index| StallRuntimeState {
                    index,
                    state: record.stall_state(index).unwrap_or(StallState::Locked),
                })
                .collect()
        });
        let unlocked = self.runtime.iter().filter(|s| s.is_unlocked()).count();
        let automated = self.runtime.iter().filter(|s| s.is_automated()).count();
        tracing::debug!(unlocked, automated, total, "stall state restored");
        &self.runtime
    }

    /// Runtime state as of the last restore or transition.
    #[must_use]
    pub fn runtime_states(&self) -> &[StallRuntimeState] {
        &self.runtime
    }

    fn refresh(&mut self, index: usize) {
        let state = self.state(index).unwrap_or(StallState::Locked);
        if let Some(entry) = self.runtime.get_mut(index) {
            entry.state = state;
        }
    }
}
