//! # Stablehand Game Loop
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ACCUMULATE                                                       │
//! │    └─ Add the variable frame delta to the accumulator               │
//! │                                                                     │
//! │ 2. FIXED TICKS (economy)                                            │
//! │    ├─ Run whole fixed steps while the accumulator covers them       │
//! │    └─ Stop at max_ticks_per_frame, drop the rest of the backlog     │
//! │                                                                     │
//! │ 3. DRAIN EVENTS                                                     │
//! │    └─ Hand every economy notification to the presentation layer     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use stablehand_economy::{EconomyEvent, EventReceiver, GameContext};

/// Default fixed timestep (60 ticks per second).
pub const FIXED_TIMESTEP: Duration = Duration::from_micros(16_666);

/// Default cap on fixed ticks run in one frame.
pub const MAX_TICKS_PER_FRAME: u32 = 8;

/// Configuration for the game loop.
#[derive(Clone, Debug)]
pub struct GameLoopConfig {
    /// Length of one economy tick.
    pub fixed_timestep: Duration,
    /// Most ticks one frame may run to catch up.
    pub max_ticks_per_frame: u32,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: FIXED_TIMESTEP,
            max_ticks_per_frame: MAX_TICKS_PER_FRAME,
        }
    }
}

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Fixed ticks run.
    pub ticks: u32,
    /// Backlog discarded by the catch-up cap.
    pub dropped: Duration,
    /// Live piles spawned.
    pub piles_spawned: u32,
    /// Piles collected by automation.
    pub auto_collected: u32,
    /// Coins paid by automation.
    pub auto_coins: u64,
    /// Piles expired.
    pub piles_expired: u32,
    /// Events drained.
    pub events_processed: u32,
}

/// Fixed-timestep driver for a [`GameContext`].
pub struct GameLoop {
    config: GameLoopConfig,
    events: EventReceiver,
    accumulator: Duration,
    frame_count: u64,
    frame_events: Vec<EconomyEvent>,
    totals: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a loop listening to `game`'s notifications.
    #[must_use]
    pub fn new(config: GameLoopConfig, game: &GameContext) -> Self {
        Self {
            config,
            events: game.events(),
            accumulator: Duration::ZERO,
            frame_count: 0,
            frame_events: Vec::new(),
            totals: FrameStatsAccumulator::default(),
        }
    }

    /// Runs one frame of `delta` real time.
    pub fn frame(&mut self, game: &mut GameContext, delta: Duration) -> FrameStats {
        let step = self.config.fixed_timestep.max(Duration::from_micros(1));
        self.accumulator += delta;

        let mut stats = FrameStats {
            frame: self.frame_count,
            ..FrameStats::default()
        };

        while self.accumulator >= step {
            if stats.ticks == self.config.max_ticks_per_frame {
                stats.dropped = self.accumulator;
                self.accumulator = Duration::ZERO;
                tracing::warn!(
                    frame = self.frame_count,
                    dropped_ms = stats.dropped.as_secs_f64() * 1000.0,
                    "frame exceeded catch-up budget"
                );
                break;
            }
            self.accumulator -= step;
            let report = game.tick(step);
            stats.ticks += 1;
            stats.piles_spawned += u32::try_from(report.spawned.len()).unwrap_or(u32::MAX);
            stats.auto_collected += report.auto_collected;
            stats.auto_coins = stats.auto_coins.saturating_add(report.auto_coins);
            stats.piles_expired += u32::try_from(report.expired.len()).unwrap_or(u32::MAX);
        }

        self.frame_events = self.events.drain();
        stats.events_processed = u32::try_from(self.frame_events.len()).unwrap_or(u32::MAX);

        self.frame_count += 1;
        self.totals.record(&stats);
        stats
    }

    /// Events drained during the last frame.
    #[must_use]
    pub fn events(&self) -> &[EconomyEvent] {
        &self.frame_events
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time carried over to the next frame.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Totals over every frame.
    #[must_use]
    pub const fn totals(&self) -> &FrameStatsAccumulator {
        &self.totals
    }
}

/// Running totals of [`FrameStats`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStatsAccumulator {
    /// Frames recorded.
    pub frames: u64,
    /// Fixed ticks run.
    pub ticks: u64,
    /// Simulated time discarded by the catch-up cap.
    pub dropped: Duration,
    /// Frames that hit the catch-up cap.
    pub frames_over_budget: u64,
    /// Live piles spawned.
    pub piles_spawned: u64,
    /// Piles collected by automation.
    pub auto_collected: u64,
    /// Coins paid by automation.
    pub auto_coins: u64,
    /// Piles expired.
    pub piles_expired: u64,
    /// Events drained.
    pub events_processed: u64,
}

impl FrameStatsAccumulator {
    /// Adds one frame.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames += 1;
        self.ticks += u64::from(stats.ticks);
        self.dropped += stats.dropped;
        if stats.dropped > Duration::ZERO {
            self.frames_over_budget += 1;
        }
        self.piles_spawned += u64::from(stats.piles_spawned);
        self.auto_collected += u64::from(stats.auto_collected);
        self.auto_coins = self.auto_coins.saturating_add(stats.auto_coins);
        self.piles_expired += u64::from(stats.piles_expired);
        self.events_processed += u64::from(stats.events_processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stablehand_economy::{EconomyConfig, MemoryStore, SpawnInterval};

    fn game() -> GameContext {
        let mut config = EconomyConfig::with_total_stalls(2);
        config.production.default_spawn_interval = SpawnInterval::new(1.0, 1.0);
        config.production.rng_seed = Some(3);
        GameContext::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    fn config(step_ms: u64, max_ticks: u32) -> GameLoopConfig {
        GameLoopConfig {
            fixed_timestep: Duration::from_millis(step_ms),
            max_ticks_per_frame: max_ticks,
        }
    }

    #[test]
    fn test_accumulates_partial_frames() {
        let mut game = game();
        let mut game_loop = GameLoop::new(config(100, 8), &game);

        let stats = game_loop.frame(&mut game, Duration::from_millis(60));
        assert_eq!(stats.ticks, 0);
        assert_eq!(game_loop.pending(), Duration::from_millis(60));

        let stats = game_loop.frame(&mut game, Duration::from_millis(60));
        assert_eq!(stats.ticks, 1);
        assert_eq!(game_loop.pending(), Duration::from_millis(20));
        assert_eq!(game_loop.frame_count(), 2);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut game = game();
        let mut game_loop = GameLoop::new(config(100, 4), &game);

        let stats = game_loop.frame(&mut game, Duration::from_secs(1));
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.dropped, Duration::from_millis(600));
        assert_eq!(game_loop.pending(), Duration::ZERO);
        assert_eq!(game_loop.totals().frames_over_budget, 1);
    }

    #[test]
    fn test_frame_drains_events() {
        let mut game = game();
        let mut game_loop = GameLoop::new(config(100, 20), &game);
        // initial balance notification
        game_loop.frame(&mut game, Duration::ZERO);

        let stats = game_loop.frame(&mut game, Duration::from_secs(1));
        assert_eq!(stats.ticks, 10);
        assert_eq!(stats.piles_spawned, 1);
        assert_eq!(stats.events_processed, 1);
        assert!(matches!(
            game_loop.events(),
            [EconomyEvent::PileSpawned { stall: 0, .. }]
        ));

        let stats = game_loop.frame(&mut game, Duration::ZERO);
        assert_eq!(stats.events_processed, 0);
        assert!(game_loop.events().is_empty());
    }

    #[test]
    fn test_totals_sum_frames() {
        let mut game = game();
        let mut game_loop = GameLoop::new(config(100, 20), &game);
        for _ in 0..30 {
            game_loop.frame(&mut game, Duration::from_millis(100));
        }
        let totals = game_loop.totals();
        assert_eq!(totals.frames, 30);
        assert_eq!(totals.ticks, 30);
        assert_eq!(totals.piles_spawned, 3);
        assert_eq!(game.piles().live_pile_count(), 3);
    }
}
