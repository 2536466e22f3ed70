//! # Economy Ledger
//!
//! **The only door coins go through.**
//!
//! Every balance mutation is one of two operations, earn or spend, so the
//! non-negative balance cannot be bypassed. Each successful mutation is
//! persisted synchronously before it becomes visible, then announced with a
//! `BalanceChanged` event.
//!
//! Composite transitions (unlocking a stall, buying automation, collecting a
//! pile) use [`credit`] and [`debit`] on the staged record inside their own
//! commit, so the coin movement and the state change land in the same save.

use std::sync::Arc;

use crate::error::{log_rejected, EconomyError, EconomyResult};
use crate::events::balance_delta;
use crate::progression::Progression;
use crate::record::ProgressionRecord;

/// Adds `amount` to the balance and lifetime earnings of a staged record.
///
/// # Errors
///
/// `InvalidAmount` for zero, `BalanceOverflow` if the balance would wrap.
pub(crate) fn credit(record: &mut ProgressionRecord, amount: u64) -> EconomyResult<()> {
    if amount == 0 {
        return Err(EconomyError::InvalidAmount(amount));
    }
    record.coin_balance = record
        .coin_balance
        .checked_add(amount)
        .ok_or(EconomyError::BalanceOverflow {
            balance: record.coin_balance,
            amount,
        })?;
    record.lifetime_coins_earned = record.lifetime_coins_earned.saturating_add(amount);
    Ok(())
}

/// Removes `amount` from the balance of a staged record.
///
/// # Errors
///
/// `InvalidAmount` for zero, `InsufficientFunds` if the balance is too low.
pub(crate) fn debit(record: &mut ProgressionRecord, amount: u64) -> EconomyResult<()> {
    if amount == 0 {
        return Err(EconomyError::InvalidAmount(amount));
    }
    record.coin_balance = record
        .coin_balance
        .checked_sub(amount)
        .ok_or(EconomyError::InsufficientFunds {
            required: amount,
            available: record.coin_balance,
        })?;
    Ok(())
}

/// Coin balance operations.
#[derive(Clone)]
pub struct Ledger {
    progression: Arc<Progression>,
}

impl Ledger {
    /// Creates a ledger over the shared progression.
    #[must_use]
    pub const fn new(progression: Arc<Progression>) -> Self {
        Self { progression }
    }

    /// Sets the in-memory balance at session start.
    ///
    /// The value comes from the store, so it is not written back. Lifetime
    /// earnings are raised if needed so they never fall below the balance.
    pub fn initialize(&self, starting_balance: u64) {
        let before = self.progression.update_unsaved(|record| {
            let before = record.coin_balance;
            record.coin_balance = starting_balance;
            record.lifetime_coins_earned = record.lifetime_coins_earned.max(starting_balance);
            before
        });
        tracing::debug!(balance = starting_balance, "ledger initialized");
        self.progression
            .events()
            .balance_changed(starting_balance, balance_delta(before, starting_balance));
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> u64 {
        self.progression.read(|r| r.coin_balance)
    }

    /// Every coin ever earned.
    #[must_use]
    pub fn lifetime_earned(&self) -> u64 {
        self.progression.read(|r| r.lifetime_coins_earned)
    }

    /// True if the balance covers `amount`. No side effects.
    #[must_use]
    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance() >= amount
    }

    /// Adds coins, persists, and returns the new balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `BalanceOverflow` or `Persistence`; the balance is unchanged.
    pub fn earn(&self, amount: u64) -> EconomyResult<u64> {
        let balance = self.progression.commit(|record| {
            credit(record, amount)?;
            Ok(record.coin_balance)
        })?;
        self.progression
            .events()
            .balance_changed(balance, balance_delta(balance - amount, balance));
        Ok(balance)
    }

    /// Adds coins. Invalid amounts and failed saves are logged and ignored.
    pub fn add_coins(&self, amount: u64) {
        if let Err(e) = self.earn(amount) {
            log_rejected("add_coins", &e);
        }
    }

    /// Removes coins, persists, and returns the new balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InsufficientFunds` or `Persistence`; the balance is unchanged.
    pub fn spend(&self, amount: u64) -> EconomyResult<u64> {
        let balance = self.progression.commit(|record| {
            debit(record, amount)?;
            Ok(record.coin_balance)
        })?;
        self.progression
            .events()
            .balance_changed(balance, balance_delta(balance + amount, balance));
        Ok(balance)
    }

    /// Removes coins if affordable. Returns `false` with no change otherwise.
    pub fn try_spend_coins(&self, amount: u64) -> bool {
        match self.spend(amount) {
            Ok(_) => true,
            Err(e) => {
                log_rejected("try_spend_coins", &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EconomyEvent, EventBus, EventReceiver};
    use crate::store::{MemoryStore, ProgressionStore};

    fn ledger() -> (Ledger, EventReceiver, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store = ProgressionStore::new(memory.clone(), 3);
        let bus = EventBus::new(64);
        let progression = Arc::new(Progression::new(store.default_record(), store, bus.sender()));
        (Ledger::new(progression), bus.receiver(), memory)
    }

    #[test]
    fn test_add_and_spend() {
        let (ledger, _events, _) = ledger();
        ledger.add_coins(100);
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.try_spend_coins(30));
        assert_eq!(ledger.balance(), 70);
        assert_eq!(ledger.lifetime_earned(), 100);
    }

    #[test]
    fn test_overspend_changes_nothing() {
        let (ledger, events, memory) = ledger();
        ledger.add_coins(50);
        events.drain();
        let writes = memory.write_count();

        assert!(!ledger.try_spend_coins(51));
        assert_eq!(ledger.balance(), 50);
        assert_eq!(memory.write_count(), writes);
        assert!(!events.has_events());
        assert_eq!(
            ledger.spend(51),
            Err(EconomyError::InsufficientFunds {
                required: 51,
                available: 50
            })
        );
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let (ledger, events, memory) = ledger();
        ledger.add_coins(0);
        assert!(!ledger.try_spend_coins(0));
        assert_eq!(ledger.balance(), 0);
        assert_eq!(memory.write_count(), 0);
        assert!(!events.has_events());
    }

    #[test]
    fn test_overflow_rejected() {
        let (ledger, _events, _) = ledger();
        ledger.add_coins(u64::MAX);
        assert!(matches!(ledger.earn(1), Err(EconomyError::BalanceOverflow { .. })));
        assert_eq!(ledger.balance(), u64::MAX);
    }

    #[test]
    fn test_can_afford_is_pure() {
        let (ledger, events, memory) = ledger();
        ledger.add_coins(10);
        events.drain();
        assert!(ledger.can_afford(10));
        assert!(!ledger.can_afford(11));
        assert!(ledger.can_afford(0));
        assert_eq!(ledger.balance(), 10);
        assert_eq!(memory.write_count(), 1);
        assert!(!events.has_events());
    }

    #[test]
    fn test_balance_events() {
        let (ledger, events, _) = ledger();
        ledger.add_coins(25);
        assert!(ledger.try_spend_coins(5));
        assert_eq!(
            events.drain(),
            vec![
                EconomyEvent::BalanceChanged {
                    balance: 25,
                    delta: 25
                },
                EconomyEvent::BalanceChanged {
                    balance: 20,
                    delta: -5
                },
            ]
        );
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let (ledger, _events, memory) = ledger();
        ledger.add_coins(10);
        ledger.add_coins(10);
        assert!(ledger.try_spend_coins(5));
        assert_eq!(memory.write_count(), 3);
    }

    #[test]
    fn test_failed_save_leaves_balance() {
        let (ledger, _events, memory) = ledger();
        ledger.add_coins(10);
        memory.fail_next_writes(1);
        assert!(!ledger.try_spend_coins(10));
        assert_eq!(ledger.balance(), 10);
        memory.fail_next_writes(1);
        ledger.add_coins(10);
        assert_eq!(ledger.balance(), 10);
    }

    #[test]
    fn test_initialize_does_not_persist() {
        let (ledger, events, memory) = ledger();
        ledger.initialize(500);
        assert_eq!(ledger.balance(), 500);
        assert!(ledger.lifetime_earned() >= 500);
        assert_eq!(memory.write_count(), 0);
        assert_eq!(
            events.drain(),
            vec![EconomyEvent::BalanceChanged {
                balance: 500,
                delta: 500
            }]
        );
    }

    #[test]
    fn test_random_sequence_keeps_balance_consistent() {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let (ledger, _events, _) = ledger();
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        let mut expected: u64 = 0;

        for _ in 0..2_000 {
            let amount = rng.gen_range(0..200u64);
            if rng.gen_bool(0.5) {
                ledger.add_coins(amount);
                if amount > 0 {
                    expected += amount;
                }
            } else if ledger.try_spend_coins(amount) {
                expected -= amount;
            } else {
                assert!(amount == 0 || amount > expected);
            }
            assert_eq!(ledger.balance(), expected);
        }
    }
}
