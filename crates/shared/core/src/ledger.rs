use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::Timestamp;

/// Time-keyed, append-only record of entries accumulated over a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger<T> {
    entries: BTreeMap<Timestamp, Vec<T>>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Ledger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, time: Timestamp, entry: T) {
        self.entries.entry(time).or_default().push(entry);
    }

    /// Entries recorded at exactly `time`
    pub fn at(&self, time: Timestamp) -> &[T] {
        self.entries.get(&time).map(Vec::as_slice).unwrap_or_default()
    }

    /// All entries in time order, then insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &T)> {
        self.entries
            .iter()
            .flat_map(|(time, entries)| entries.iter().map(move |e| (*time, e)))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
