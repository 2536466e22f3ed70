//! # Economy Error Types
//!
//! All errors that can occur in the progression and economy system.
//!
//! None of these are fatal. The boolean entry points (`try_*`) log the error
//! and report `false`; the `Result` entry points hand it to the caller.

use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// Amount was zero (coins are always moved in positive amounts).
    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    /// Tried to spend more than the current balance.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// The amount required.
        required: u64,
        /// The current balance.
        available: u64,
    },

    /// Adding coins would overflow the balance.
    #[error("balance overflow: {balance} + {amount}")]
    BalanceOverflow {
        /// Balance before the add.
        balance: u64,
        /// Amount that was being added.
        amount: u64,
    },

    /// Stall index is outside `0..total_stalls`.
    #[error("stall {index} out of range (total stalls: {total})")]
    StallOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of stalls in the configuration.
        total: usize,
    },

    /// Stall has not been unlocked yet.
    #[error("stall {0} is locked")]
    StallLocked(usize),

    /// Stall is already automated.
    #[error("stall {0} is already automated")]
    AlreadyAutomated(usize),

    /// Every stall is already unlocked.
    #[error("all stalls are unlocked")]
    AllStallsUnlocked,

    /// The configuration has no definition for this stall.
    #[error("no stall definition for index {0}")]
    MissingStallDefinition(usize),

    /// Pile does not exist or is no longer live.
    #[error("pile not found: {0}")]
    PileNotFound(u64),

    /// Writing or reading the persistence store failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Stored data failed its integrity check or could not be decoded.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EconomyError {
    /// Returns true for the expected negative outcomes of a purchase
    /// (not enough coins, nothing left to buy, already bought).
    ///
    /// These are logged at debug level rather than as warnings.
    #[must_use]
    pub const fn is_expected_refusal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. } | Self::AllStallsUnlocked | Self::AlreadyAutomated(_)
        )
    }
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;

/// Logs an operation the boolean API is about to report as `false`.
pub(crate) fn log_rejected(operation: &'static str, error: &EconomyError) {
    if error.is_expected_refusal() {
        tracing::debug!(operation, %error, "operation refused");
    } else {
        tracing::warn!(operation, %error, "operation rejected");
    }
}
