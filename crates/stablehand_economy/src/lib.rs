//! # Stablehand Economy
//!
//! Progression and economy engine for the Stablehand idle game.
//!
//! ## Design Principles
//!
//! 1. **One door for coins** - every balance change goes through the ledger
//! 2. **Strict sequence** - stalls unlock in order, one at a time
//! 3. **Persist before visible** - a mutation that fails to save never happened
//! 4. **External configuration** - all balance data in TOML files
//!
//! ## Threading
//!
//! Gameplay runs on a single logical thread driven by `tick`. The record sits
//! behind one lock so UI reads and background saves always see a committed
//! snapshot.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stablehand_economy::{EconomyConfig, FileStore, GameContext};
//!
//! let config = EconomyConfig::from_toml_file("data/schemas/economy/stalls.toml")?;
//! let store = Arc::new(FileStore::open("saves")?);
//! let mut game = GameContext::new(config, store)?;
//!
//! let report = game.tick(std::time::Duration::from_millis(16));
//! for pile in report.spawned {
//!     game.try_collect_pile(pile);
//! }
//! game.try_unlock_next_stall();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod cost;
pub mod error;
pub mod events;
pub mod ledger;
pub mod piles;
pub mod progression;
pub mod record;
pub mod stalls;
pub mod store;

pub use config::{
    CostConfig, EconomyConfig, ProductionConfig, RewardConfig, SpawnInterval, StallDefinition,
};
pub use context::GameContext;
pub use cost::{CostModel, CostPreview};
pub use error::{EconomyError, EconomyResult};
pub use events::{EconomyEvent, EventBus, EventReceiver, EventSender, PileId};
pub use ledger::Ledger;
pub use piles::{Pile, PileAccounting, PileState, TickReport};
pub use progression::Progression;
pub use record::{
    CustomizationSelection, PlayerIdentity, ProgressionRecord, RecordRepair, StallRuntimeState,
    StallState,
};
pub use stalls::StallLifecycle;
pub use store::{
    FileStore, KeyValueStore, MemoryStore, ProgressionStore, RecordSource, PROGRESSION_KEY,
};
