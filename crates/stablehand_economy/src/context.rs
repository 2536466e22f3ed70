//! # Game Context
//!
//! Composition root of the economy. Built once per session from a
//! configuration and a store; owns every component and hands out the event
//! receiver to the presentation layer.
//!
//! ## Startup
//!
//! ```text
//! 1. Validate config
//! 2. Load record (absent or corrupt -> defaults)
//! 3. Normalize against total_stalls, save if anything was repaired
//! 4. Ledger initialization from the stored balance
//! 5. Stall restoration (no spend, no one-shot events)
//! 6. Start production for every unlocked stall
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::config::EconomyConfig;
use crate::error::{log_rejected, EconomyResult};
use crate::events::{balance_delta, EconomyEvent, EventBus, EventReceiver, PileId};
use crate::ledger::Ledger;
use crate::piles::{Pile, PileAccounting, TickReport};
use crate::progression::Progression;
use crate::record::{CustomizationSelection, PlayerIdentity, ProgressionRecord};
use crate::stalls::StallLifecycle;
use crate::store::{KeyValueStore, ProgressionStore, RecordSource};

/// One player session of the economy.
pub struct GameContext {
    config: Arc<EconomyConfig>,
    progression: Arc<Progression>,
    ledger: Ledger,
    stalls: StallLifecycle,
    piles: PileAccounting,
    bus: EventBus,
    source: RecordSource,
}

impl GameContext {
    /// Loads the saved progression from `store` and starts the session.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation. A missing or
    /// corrupt save is not an error.
    pub fn new(config: EconomyConfig, store: Arc<dyn KeyValueStore>) -> EconomyResult<Self> {
        config.validate()?;
        let total = config.total_stalls;
        let store = ProgressionStore::new(store, total);

        let (mut record, source) = store.load_with_source();
        let repairs = record.normalize(total);
        for repair in &repairs {
            tracing::warn!(?repair, "saved progression repaired");
        }
        if !repairs.is_empty() {
            if let Err(e) = store.save(&record) {
                tracing::warn!(error = %e, "could not save repaired progression");
            }
        }

        let starting_balance = record.coin_balance;
        let bus = EventBus::new(config.event_capacity);
        let config = Arc::new(config);
        let progression = Arc::new(Progression::new(record, store, bus.sender()));
        let ledger = Ledger::new(progression.clone());
        let stalls = StallLifecycle::new(progression.clone(), config.clone());
        let piles = PileAccounting::new(progression.clone(), config.clone());

        let mut context = Self {
            config,
            progression,
            ledger,
            stalls,
            piles,
            bus,
            source,
        };
        context.ledger.initialize(starting_balance);
        context.stalls.restore();
        context.start_production();

        tracing::info!(
            ?source,
            balance = starting_balance,
            unlocked = context.progression.read(|r| r.stalls_unlocked_count),
            total_stalls = total,
            "game context ready"
        );
        Ok(context)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Where the record came from at startup.
    #[must_use]
    pub const fn record_source(&self) -> RecordSource {
        self.source
    }

    /// Coin ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Stall state machine.
    #[must_use]
    pub const fn stalls(&self) -> &StallLifecycle {
        &self.stalls
    }

    /// Production and live piles.
    #[must_use]
    pub const fn piles(&self) -> &PileAccounting {
        &self.piles
    }

    /// A receiver for economy notifications.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Consistent copy of the committed record.
    #[must_use]
    pub fn snapshot(&self) -> ProgressionRecord {
        self.progression.snapshot()
    }

    /// Advances production and expiry by `dt`.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        self.piles.tick(dt)
    }

    /// Unlocks the next stall and starts its production.
    ///
    /// # Errors
    ///
    /// See [`StallLifecycle::unlock_next`].
    pub fn unlock_next_stall(&mut self) -> EconomyResult<usize> {
        let index = self.stalls.unlock_next()?;
        if let Err(e) = self.piles.initialize_production(index) {
            log_rejected("initialize_production", &e);
        }
        Ok(index)
    }

    /// Unlocks the next stall. Returns `false` with no change if it cannot.
    pub fn try_unlock_next_stall(&mut self) -> bool {
        match self.unlock_next_stall() {
            Ok(_) => true,
            Err(e) => {
                log_rejected("try_unlock_next_stall", &e);
                false
            }
        }
    }

    /// Buys automation for stall `index`.
    ///
    /// # Errors
    ///
    /// See [`StallLifecycle::automate`].
    pub fn automate_stall(&mut self, index: usize) -> EconomyResult<()> {
        self.stalls.automate(index)
    }

    /// Buys automation. Returns `false` with no change if it cannot.
    pub fn try_automate_stall(&mut self, index: usize) -> bool {
        self.stalls.try_automate(index)
    }

    /// Collects a live pile for the manual reward.
    ///
    /// # Errors
    ///
    /// See [`PileAccounting::collect`].
    pub fn collect_pile(&mut self, pile: PileId) -> EconomyResult<u64> {
        self.piles.collect(pile)
    }

    /// Collects a live pile. Returns `false` with no change if it cannot.
    pub fn try_collect_pile(&mut self, pile: PileId) -> bool {
        self.piles.try_collect(pile)
    }

    /// Starts production of an unlocked stall. Already producing is a no-op.
    ///
    /// # Errors
    ///
    /// See [`PileAccounting::initialize_production`].
    pub fn initialize_production(&mut self, stall: usize) -> EconomyResult<()> {
        self.piles.initialize_production(stall)
    }

    /// Expires a live pile with no reward, e.g. when the scene removes it.
    /// Returns the pile in its final state, or `None` if it was not live.
    pub fn expire_pile(&mut self, pile: PileId) -> Option<Pile> {
        self.piles.on_expiry(pile)
    }

    /// Stores the player's cosmetic choices.
    ///
    /// # Errors
    ///
    /// `Persistence` if the save fails; the previous selection is kept.
    pub fn set_customization(&self, selection: CustomizationSelection) -> EconomyResult<()> {
        self.progression.commit(|record| {
            record.customization = selection;
            Ok(())
        })
    }

    /// Stores the signed-in player's identity.
    ///
    /// # Errors
    ///
    /// `Persistence` if the save fails; the previous identity is kept.
    pub fn set_identity(&self, identity: PlayerIdentity) -> EconomyResult<()> {
        self.progression.commit(|record| {
            record.identity = identity;
            Ok(())
        })
    }

    /// Forgets the signed-in player's identity.
    ///
    /// # Errors
    ///
    /// `Persistence` if the save fails.
    pub fn clear_identity(&self) -> EconomyResult<()> {
        self.set_identity(PlayerIdentity::default())
    }

    /// Replaces all progress with first-launch defaults.
    ///
    /// Live piles are discarded and production restarts for the free stall.
    ///
    /// # Errors
    ///
    /// `Persistence` if the defaults cannot be saved; nothing changes.
    pub fn reset_to_defaults(&mut self) -> EconomyResult<()> {
        let before = self.ledger.balance();
        let defaults = self.progression.store().default_record();
        self.progression.replace(defaults)?;

        self.piles.clear();
        self.stalls.restore();
        self.start_production();

        let events = self.progression.events();
        events.balance_changed(0, balance_delta(before, 0));
        events.send(EconomyEvent::ProgressReset);
        tracing::info!(previous_balance = before, "progress reset to defaults");
        Ok(())
    }

    fn start_production(&mut self) {
        for index in 0..self.config.total_stalls {
            if !self.stalls.is_unlocked(index) {
                break;
            }
            if let Err(e) = self.piles.initialize_production(index) {
                log_rejected("initialize_production", &e);
            }
        }
    }
}
