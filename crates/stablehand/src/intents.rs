//! # Player Intents
//!
//! Everything the player can ask of the economy, as data. Input handling
//! (clicks, proximity triggers, menu buttons) produces a [`PlayerIntent`];
//! [`dispatch`] applies it and reports what happened.

use stablehand_economy::{CustomizationSelection, EconomyError, GameContext, PileId};

/// A player action aimed at the economy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerIntent {
    /// Buy the next stall in sequence.
    UnlockNextStall,
    /// Buy automation for a stall.
    AutomateStall(usize),
    /// Pick up a pile (the player walked into it).
    CollectPile(PileId),
    /// Save new cosmetic choices.
    SelectCustomization(CustomizationSelection),
    /// Wipe all progress.
    ResetProgress,
}

/// Result of a dispatched intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Stall unlocked.
    Unlocked(usize),
    /// Stall automated.
    Automated(usize),
    /// Pile collected.
    Collected {
        /// The pile.
        pile: PileId,
        /// Coins paid.
        reward: u64,
    },
    /// Customization saved.
    CustomizationSaved,
    /// Progress reset to defaults.
    ProgressReset,
    /// Nothing changed.
    Rejected(EconomyError),
}

impl IntentOutcome {
    /// True if the intent took effect.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Applies `intent` to the game.
pub fn dispatch(game: &mut GameContext, intent: PlayerIntent) -> IntentOutcome {
    let result = match &intent {
        PlayerIntent::UnlockNextStall => game.unlock_next_stall().map(IntentOutcome::Unlocked),
        PlayerIntent::AutomateStall(index) => game
            .automate_stall(*index)
            .map(|()| IntentOutcome::Automated(*index)),
        PlayerIntent::CollectPile(pile) => game
            .collect_pile(*pile)
            .map(|reward| IntentOutcome::Collected {
                pile: *pile,
                reward,
            }),
        PlayerIntent::SelectCustomization(selection) => game
            .set_customization(*selection)
            .map(|()| IntentOutcome::CustomizationSaved),
        PlayerIntent::ResetProgress => game
            .reset_to_defaults()
            .map(|()| IntentOutcome::ProgressReset),
    };

    result.unwrap_or_else(|error| {
        tracing::debug!(?intent, %error, "intent rejected");
        IntentOutcome::Rejected(error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use stablehand_economy::{EconomyConfig, MemoryStore, SpawnInterval};

    fn game() -> GameContext {
        let mut config = EconomyConfig::with_total_stalls(3);
        config.production.default_spawn_interval = SpawnInterval::new(1.0, 1.0);
        config.production.rng_seed = Some(5);
        GameContext::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_unlock_intent() {
        let mut game = game();
        assert_eq!(
            dispatch(&mut game, PlayerIntent::UnlockNextStall),
            IntentOutcome::Rejected(EconomyError::InsufficientFunds {
                required: 100,
                available: 0
            })
        );
        game.ledger().add_coins(100);
        assert_eq!(
            dispatch(&mut game, PlayerIntent::UnlockNextStall),
            IntentOutcome::Unlocked(1)
        );
    }

    #[test]
    fn test_automate_intent() {
        let mut game = game();
        game.ledger().add_coins(1_000);
        let outcome = dispatch(&mut game, PlayerIntent::AutomateStall(0));
        assert!(outcome.is_accepted());
        assert_eq!(
            dispatch(&mut game, PlayerIntent::AutomateStall(0)),
            IntentOutcome::Rejected(EconomyError::AlreadyAutomated(0))
        );
    }

    #[test]
    fn test_collect_intent() {
        let mut game = game();
        let pile = game.tick(Duration::from_secs(1)).spawned[0];
        assert_eq!(
            dispatch(&mut game, PlayerIntent::CollectPile(pile)),
            IntentOutcome::Collected { pile, reward: 10 }
        );
        assert!(!dispatch(&mut game, PlayerIntent::CollectPile(pile)).is_accepted());
    }

    #[test]
    fn test_customization_and_reset_intents() {
        let mut game = game();
        let selection = CustomizationSelection {
            body_type: 1,
            color_palette: 1,
            hat: 4,
        };
        assert_eq!(
            dispatch(&mut game, PlayerIntent::SelectCustomization(selection)),
            IntentOutcome::CustomizationSaved
        );
        assert_eq!(game.snapshot().customization, selection);

        game.ledger().add_coins(50);
        assert_eq!(
            dispatch(&mut game, PlayerIntent::ResetProgress),
            IntentOutcome::ProgressReset
        );
        assert_eq!(game.ledger().balance(), 0);
        assert_eq!(game.snapshot().customization, CustomizationSelection::default());
    }
}
