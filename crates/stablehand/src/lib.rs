//! # Stablehand
//!
//! Game-side integration of the progression & economy engine.
//!
//! ## Modules
//!
//! - `intents`: player actions and their dispatch
//! - `game_loop`: fixed-timestep driving and event drain

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod game_loop;
pub mod intents;

// Re-export the engine
pub use stablehand_economy as economy;

pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop, GameLoopConfig};
pub use intents::{dispatch, IntentOutcome, PlayerIntent};
