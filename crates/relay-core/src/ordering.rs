//! Output ordering for concurrently forwarded messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Order in which forward outcomes are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputOrder {
    /// Write each outcome as soon as its forward completes. Outcomes may
    /// appear in a different order than their input lines.
    #[default]
    Completion,
    /// Write outcomes strictly in input-line order.
    Arrival,
}

/// Holds out-of-order items until every earlier sequence number has arrived.
///
/// Sequence numbers start at 0 and must be unique.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert item `seq` and return the run of items now releasable in order.
    pub fn insert(&mut self, seq: u64, item: T) -> Vec<T> {
        if seq < self.next {
            tracing::warn!("Dropping duplicate sequence number {seq}");
            return Vec::new();
        }
        self.pending.insert(seq, item);

        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            ready.push(item);
            self.next += 1;
        }
        ready
    }

    /// Number of items waiting on an earlier sequence number.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
