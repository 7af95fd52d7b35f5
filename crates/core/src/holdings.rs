//! Item counts - the live inventory snapshot and its planning-time copy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::id::ItemKind;

/// Counts per item kind.
///
/// Zero counts are never stored, so two holdings with the same positive
/// counts compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Holdings(BTreeMap<ItemKind, u32>);

impl Holdings {
    /// Empty holdings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units of `item` held.
    pub fn count(&self, item: &ItemKind) -> u32 {
        self.0.get(item).copied().unwrap_or(0)
    }

    /// Add `amount` units of `item`.
    pub fn add(&mut self, item: &ItemKind, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.0.entry(item.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Remove `amount` units of `item` if that many are held.
    ///
    /// Returns false and leaves the holdings untouched otherwise.
    pub fn take(&mut self, item: &ItemKind, amount: u32) -> bool {
        let have = self.count(item);
        if have < amount {
            return false;
        }
        if have == amount {
            self.0.remove(item);
        } else {
            self.0.insert(item.clone(), have - amount);
        }
        true
    }

    /// Overwrite the count for `item`.
    pub fn set(&mut self, item: &ItemKind, count: u32) {
        if count == 0 {
            self.0.remove(item);
        } else {
            self.0.insert(item.clone(), count);
        }
    }

    /// Held items in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKind, u32)> {
        self.0.iter().map(|(item, count)| (item, *count))
    }

    /// Number of distinct item kinds held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total units across all kinds.
    pub fn total(&self) -> u64 {
        self.0.values().map(|c| u64::from(*c)).sum()
    }
}

impl<K: Into<ItemKind>> FromIterator<(K, u32)> for Holdings {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        let mut holdings = Holdings::new();
        for (item, count) in iter {
            holdings.add(&item.into(), count);
        }
        holdings
    }
}
