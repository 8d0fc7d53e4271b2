//! Pending-record queue.

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::storage::record::{Batch, Record};

/// Records accepted by the writer but not yet dispatched in a flush.
///
/// Only the control loop pushes and detaches; the lock exists so the writer
/// handle can report the queue length.
#[derive(Debug, Default)]
pub(crate) struct RecordQueue {
    records: Mutex<Batch>,
}

impl RecordQueue {
    fn lock(&self) -> MutexGuard<'_, Batch> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a record and returns the new queue length.
    pub(crate) fn push(&self, record: Record) -> usize {
        let mut records = self.lock();
        records.push(record);
        records.len()
    }

    /// Swaps the queue for an empty one and returns what it held.
    pub(crate) fn detach(&self) -> Batch {
        mem::take(&mut *self.lock())
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
