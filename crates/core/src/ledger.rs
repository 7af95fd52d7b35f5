//! Craft-count ledger - how much of each item execution has produced.
//!
//! Presentation layers order recipe listings by these counts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use crate::id::ItemKind;
use crate::Time;

/// Side channel the scheduler reports produced items to.
pub trait CraftLedger {
    /// Record `amount` units of `item` produced.
    fn record(&mut self, item: &ItemKind, amount: u32);
}

/// Usage of one item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Total units produced
    pub crafted: u64,

    /// When the last craft was recorded
    pub last_crafted: Time,
}

/// In-memory craft counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CraftCounts {
    entries: BTreeMap<ItemKind, LedgerEntry>,
}

impl CraftCounts {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units of `item` produced so far.
    pub fn count(&self, item: &ItemKind) -> u64 {
        self.entries.get(item).map(|e| e.crafted).unwrap_or(0)
    }

    /// When `item` was last produced.
    pub fn last_crafted(&self, item: &ItemKind) -> Option<Time> {
        self.entries.get(item).map(|e| e.last_crafted)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recorded items in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKind, &LedgerEntry)> {
        self.entries.iter()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Presentation order: most crafted first, then most recently crafted.
    /// Items never crafted compare equal to each other.
    pub fn compare_usage(&self, a: &ItemKind, b: &ItemKind) -> Ordering {
        self.count(b)
            .cmp(&self.count(a))
            .then_with(|| self.last_crafted(b).cmp(&self.last_crafted(a)))
    }

    pub(crate) fn record_at(&mut self, item: &ItemKind, amount: u32, at: Time) {
        let entry = self.entries.entry(item.clone()).or_insert(LedgerEntry {
            crafted: 0,
            last_crafted: at,
        });
        entry.crafted += u64::from(amount);
        entry.last_crafted = at;
    }
}

impl CraftLedger for CraftCounts {
    fn record(&mut self, item: &ItemKind, amount: u32) {
        self.record_at(item, amount, chrono::Utc::now());
    }
}
