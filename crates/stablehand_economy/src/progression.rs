//! # Shared Progression State
//!
//! The in-memory [`ProgressionRecord`] shared by the ledger, the stall state
//! machine, pile accounting and UI read paths.
//!
//! ## Commit Protocol
//!
//! ```text
//! commit(mutate):
//!   1. Take the write lock
//!   2. Snapshot the record
//!   3. Apply the mutation in place
//!   4. Save the whole record
//!   5. On any failure in 3 or 4: restore the snapshot
//! ```
//!
//! Readers only ever see committed state, and the store only ever receives
//! complete records in commit order because saves happen under the lock.

use parking_lot::RwLock;

use crate::error::EconomyResult;
use crate::events::EventSender;
use crate::record::ProgressionRecord;
use crate::store::ProgressionStore;

/// Single-writer owner of the live progression record.
pub struct Progression {
    record: RwLock<ProgressionRecord>,
    store: ProgressionStore,
    events: EventSender,
}

impl Progression {
    /// Wraps an already loaded record.
    #[must_use]
    pub fn new(record: ProgressionRecord, store: ProgressionStore, events: EventSender) -> Self {
        Self {
            record: RwLock::new(record),
            store,
            events,
        }
    }

    /// Runs `f` against the committed record under a read lock.
    pub fn read<R>(&self, f: impl FnOnce(&ProgressionRecord) -> R) -> R {
        f(&self.record.read())
    }

    /// Copy of the committed record.
    #[must_use]
    pub fn snapshot(&self) -> ProgressionRecord {
        self.record.read().clone()
    }

    /// Notification channel.
    #[must_use]
    pub const fn events(&self) -> &EventSender {
        &self.events
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &ProgressionStore {
        &self.store
    }

    /// Applies `mutate` and persists the result as one transaction.
    ///
    /// If `mutate` fails or the save fails, the record is rolled back and
    /// the error returned; nothing is visible to readers.
    ///
    /// # Errors
    ///
    /// The mutation's own error, or `Persistence` from the store.
    pub(crate) fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut ProgressionRecord) -> EconomyResult<T>,
    ) -> EconomyResult<T> {
        let mut record = self.record.write();
        let snapshot = record.clone();

        let value = match mutate(&mut record) {
            Ok(value) => value,
            Err(e) => {
                *record = snapshot;
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&record) {
            tracing::warn!(error = %e, "save failed, rolling back");
            *record = snapshot;
            return Err(e);
        }
        Ok(value)
    }

    /// Persists `replacement` and swaps it in.
    ///
    /// # Errors
    ///
    /// `Persistence` if the save fails; the live record is left untouched.
    pub(crate) fn replace(&self, replacement: ProgressionRecord) -> EconomyResult<()> {
        let mut record = self.record.write();
        self.store.save(&replacement)?;
        *record = replacement;
        Ok(())
    }

    /// Mutates the record without persisting.
    ///
    /// Only for values that just came from the store (session start).
    pub(crate) fn update_unsaved<R>(&self, f: impl FnOnce(&mut ProgressionRecord) -> R) -> R {
        f(&mut self.record.write())
    }
}
