//! # Economy Configuration
//!
//! Static balance data: cost curve parameters, rewards, production timing
//! and the per-stall definition table. Loaded once at startup from TOML.
//!
//! ```toml
//! total_stalls = 5
//!
//! [costs]
//! base_unlock_cost = 100
//! unlock_multiplier = 2.5
//! automation_base_cost = 1000
//! automation_increment_per_index = 500
//!
//! [rewards]
//! base_manual_reward = 10
//! base_automated_reward = 5
//!
//! [production]
//! default_spawn_interval = { min_secs = 5.0, max_secs = 15.0 }
//! default_pile_lifetime_secs = 0.0
//!
//! [[stalls]]
//! index = 0
//! reward_bonus = 0
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};

/// Default event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Default number of stalls.
pub const DEFAULT_TOTAL_STALLS: usize = 5;

/// Parameters of the cost model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Unlock cost of stall 1; later stalls scale by `unlock_multiplier`.
    pub base_unlock_cost: u64,
    /// Growth factor of the unlock cost per stall index.
    pub unlock_multiplier: f64,
    /// Automation cost of stall 0.
    pub automation_base_cost: u64,
    /// Automation cost added per stall index.
    pub automation_increment_per_index: u64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            base_unlock_cost: 100,
            unlock_multiplier: 2.5,
            automation_base_cost: 1000,
            automation_increment_per_index: 500,
        }
    }
}

/// Base rewards for collecting a pile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Coins for a pile the player walked to.
    pub base_manual_reward: u64,
    /// Coins for a pile collected by automation. Must be below the manual reward.
    pub base_automated_reward: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_manual_reward: 10,
            base_automated_reward: 5,
        }
    }
}

/// Uniform range a production interval is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnInterval {
    /// Lower bound in seconds.
    pub min_secs: f64,
    /// Upper bound in seconds (inclusive).
    pub max_secs: f64,
}

impl SpawnInterval {
    /// Creates a new interval range.
    #[must_use]
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Draws an interval uniformly from `[min_secs, max_secs]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rng.gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }

    fn validate(&self, what: &str) -> EconomyResult<()> {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() || self.min_secs < 0.0 {
            return Err(EconomyError::InvalidConfig(format!(
                "{what}: spawn interval bounds must be finite and non-negative"
            )));
        }
        if self.max_secs < self.min_secs {
            return Err(EconomyError::InvalidConfig(format!(
                "{what}: spawn interval max ({}) below min ({})",
                self.max_secs, self.min_secs
            )));
        }
        Ok(())
    }
}

impl Default for SpawnInterval {
    fn default() -> Self {
        Self::new(5.0, 15.0)
    }
}

/// Production timing shared by all stalls unless a stall overrides it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Interval range used by stalls without their own.
    pub default_spawn_interval: SpawnInterval,
    /// Pile lifetime in seconds used by stalls without their own. 0 = never expires.
    pub default_pile_lifetime_secs: f64,
    /// Seed for interval sampling. `None` seeds from the system clock.
    pub rng_seed: Option<u64>,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            default_spawn_interval: SpawnInterval::default(),
            default_pile_lifetime_secs: 0.0,
            rng_seed: None,
        }
    }
}

/// Static definition of one stall.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StallDefinition {
    /// Position in the unlock sequence.
    pub index: usize,
    /// Fixed unlock cost; `None` uses the cost curve.
    #[serde(default)]
    pub unlock_cost_override: Option<u64>,
    /// Fixed automation cost; `None` uses the cost curve.
    #[serde(default)]
    pub automation_cost_override: Option<u64>,
    /// Added to the base reward of every pile this stall produces.
    #[serde(default)]
    pub reward_bonus: u64,
    /// Production interval for this stall.
    #[serde(default)]
    pub spawn_interval: Option<SpawnInterval>,
    /// Pile lifetime for this stall in seconds. 0 = never expires.
    #[serde(default)]
    pub pile_lifetime_secs: Option<f64>,
}

impl StallDefinition {
    /// Creates a definition with no overrides.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Sets the reward bonus.
    #[must_use]
    pub const fn with_reward_bonus(mut self, bonus: u64) -> Self {
        self.reward_bonus = bonus;
        self
    }

    /// Sets a fixed unlock cost.
    #[must_use]
    pub const fn with_unlock_cost(mut self, cost: u64) -> Self {
        self.unlock_cost_override = Some(cost);
        self
    }

    /// Sets a fixed automation cost.
    #[must_use]
    pub const fn with_automation_cost(mut self, cost: u64) -> Self {
        self.automation_cost_override = Some(cost);
        self
    }

    /// Sets the production interval range.
    #[must_use]
    pub const fn with_spawn_interval(mut self, interval: SpawnInterval) -> Self {
        self.spawn_interval = Some(interval);
        self
    }

    /// Sets the pile lifetime in seconds.
    #[must_use]
    pub const fn with_pile_lifetime(mut self, secs: f64) -> Self {
        self.pile_lifetime_secs = Some(secs);
        self
    }
}

/// Complete economy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Number of stalls in the unlock sequence.
    pub total_stalls: usize,
    /// Capacity of the notification channel.
    pub event_capacity: usize,
    /// Cost model parameters.
    pub costs: CostConfig,
    /// Reward parameters.
    pub rewards: RewardConfig,
    /// Production timing.
    pub production: ProductionConfig,
    /// Per-stall definitions. May be shorter than `total_stalls`. Left out of
    /// a TOML document, the default table is built for the parsed `total_stalls`.
    #[serde(default)]
    pub stalls: Vec<StallDefinition>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self::with_total_stalls(DEFAULT_TOTAL_STALLS)
    }
}

impl EconomyConfig {
    /// Default configuration with `total` stalls, each with a bonus of twice its index.
    #[must_use]
    pub fn with_total_stalls(total: usize) -> Self {
        Self {
            total_stalls: total,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            costs: CostConfig::default(),
            rewards: RewardConfig::default(),
            production: ProductionConfig::default(),
            stalls: default_stall_table(total),
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document does not parse or fails validation.
    pub fn from_toml_str(source: &str) -> EconomyResult<Self> {
        let mut config: Self = toml::from_str(source)
            .map_err(|e| EconomyError::InvalidConfig(format!("failed to parse economy config: {e}")))?;
        if config.stalls.is_empty() {
            config.stalls = default_stall_table(config.total_stalls);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read, parsed or validated.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EconomyError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the configuration for values the engine cannot run with.
    ///
    /// A definition table shorter than `total_stalls` is allowed (logged);
    /// operations on the undefined stalls are skipped at runtime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.total_stalls == 0 {
            return Err(EconomyError::InvalidConfig(
                "total_stalls must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(EconomyError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        if !self.costs.unlock_multiplier.is_finite() || self.costs.unlock_multiplier < 0.0 {
            return Err(EconomyError::InvalidConfig(format!(
                "unlock_multiplier must be finite and non-negative, got {}",
                self.costs.unlock_multiplier
            )));
        }
        if self.rewards.base_automated_reward >= self.rewards.base_manual_reward {
            return Err(EconomyError::InvalidConfig(format!(
                "base_automated_reward ({}) must be below base_manual_reward ({})",
                self.rewards.base_automated_reward, self.rewards.base_manual_reward
            )));
        }
        self.production
            .default_spawn_interval
            .validate("production.default_spawn_interval")?;
        validate_lifetime(
            self.production.default_pile_lifetime_secs,
            "production.default_pile_lifetime_secs",
        )?;

        let mut seen = HashSet::with_capacity(self.stalls.len());
        for def in &self.stalls {
            if !seen.insert(def.index) {
                return Err(EconomyError::InvalidConfig(format!(
                    "duplicate stall definition for index {}",
                    def.index
                )));
            }
            if def.index >= self.total_stalls {
                tracing::warn!(
                    index = def.index,
                    total_stalls = self.total_stalls,
                    "stall definition beyond total_stalls is ignored"
                );
            }
            if let Some(interval) = &def.spawn_interval {
                interval.validate(&format!("stalls[{}].spawn_interval", def.index))?;
            }
            if let Some(secs) = def.pile_lifetime_secs {
                validate_lifetime(secs, &format!("stalls[{}].pile_lifetime_secs", def.index))?;
            }
        }

        let defined = (0..self.total_stalls).filter(|i| seen.contains(i)).count();
        if defined < self.total_stalls {
            tracing::warn!(
                defined,
                total_stalls = self.total_stalls,
                "fewer stall definitions than stalls; undefined stalls cannot be unlocked or automated"
            );
        }
        Ok(())
    }

    /// Looks up the definition for a stall index.
    #[must_use]
    pub fn definition(&self, index: usize) -> Option<&StallDefinition> {
        if index >= self.total_stalls {
            return None;
        }
        self.stalls.iter().find(|def| def.index == index)
    }

    /// Production interval range for a stall (override or global default).
    #[must_use]
    pub fn spawn_interval(&self, index: usize) -> SpawnInterval {
        self.definition(index)
            .and_then(|def| def.spawn_interval)
            .unwrap_or(self.production.default_spawn_interval)
    }

    /// Pile lifetime for a stall. `None` means piles never expire.
    #[must_use]
    pub fn pile_lifetime(&self, index: usize) -> Option<Duration> {
        let secs = self
            .definition(index)
            .and_then(|def| def.pile_lifetime_secs)
            .unwrap_or(self.production.default_pile_lifetime_secs);
        (secs > 0.0).then(|| Duration::from_secs_f64(secs))
    }
}

fn validate_lifetime(secs: f64, what: &str) -> EconomyResult<()> {
    if secs.is_finite() && secs >= 0.0 {
        Ok(())
    } else {
        Err(EconomyError::InvalidConfig(format!(
            "{what} must be finite and non-negative, got {secs}"
        )))
    }
}

/// One definition per stall, each with a bonus of twice its index.
fn default_stall_table(total: usize) -> Vec<StallDefinition> {
    (0..total)
        .map(|index| StallDefinition::new(index).with_reward_bonus(index as u64 * 2))
        .collect()
}
