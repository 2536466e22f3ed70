//! # Economy Events
//!
//! Notifications from the economy core to the presentation layer.
//!
//! ```text
//! Ledger / Stalls / Piles ──> EventSender ──> [bounded channel] ──> EventReceiver ──> UI
//! ```
//!
//! Fire-and-forget: every event is sent after the mutation that caused it has
//! been committed. The presentation layer drains the receiver once per frame.
//! If the channel is full the event is dropped; state is always readable from
//! the record, so a dropped notification only delays a UI refresh.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Pile identifier, unique for the lifetime of a session.
pub type PileId = u64;

/// Events emitted by the economy core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EconomyEvent {
    /// Coin balance changed.
    BalanceChanged {
        /// New balance.
        balance: u64,
        /// Signed change that produced it.
        delta: i64,
    },
    /// A stall moved from Locked to Unlocked.
    StallUnlocked {
        /// Stall index.
        index: usize,
    },
    /// A stall moved from Unlocked to Automated.
    StallAutomated {
        /// Stall index.
        index: usize,
    },
    /// A pile appeared and is waiting for the player.
    PileSpawned {
        /// Pile id.
        pile: PileId,
        /// Producing stall.
        stall: usize,
    },
    /// A pile was collected and paid out.
    PileCollected {
        /// Pile id.
        pile: PileId,
        /// Producing stall.
        stall: usize,
        /// Coins paid.
        reward: u64,
        /// True if automation collected it.
        automated: bool,
    },
    /// A pile timed out without being collected.
    PileExpired {
        /// Pile id.
        pile: PileId,
        /// Producing stall.
        stall: usize,
    },
    /// Progress was reset to first-launch defaults.
    ProgressReset,
}

/// Event channel for economy notifications.
pub struct EventBus {
    sender: Sender<EconomyEvent>,
    receiver: Receiver<EconomyEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<EconomyEvent>,
}

impl EventSender {
    /// Sends an event without blocking. Returns `false` if it was dropped.
    #[inline]
    pub fn send(&self, event: EconomyEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::debug!(?event, "event channel full, notification dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sends a balance change notification.
    pub(crate) fn balance_changed(&self, balance: u64, delta: i64) {
        self.send(EconomyEvent::BalanceChanged { balance, delta });
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<EconomyEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    #[inline]
    pub fn drain(&self) -> Vec<EconomyEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending event, if any.
    #[inline]
    pub fn try_recv(&self) -> Option<EconomyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// True if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

/// Signed delta between two balances, saturating at the `i64` bounds.
pub(crate) fn balance_delta(before: u64, after: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map_or(i64::MIN, |d| -d)
    }
}
