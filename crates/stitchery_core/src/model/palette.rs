//! Palette entries and the per-floss usage ledger.
//!
//! # Responsibility
//! - Map palette keys to floss identity and rendering attributes.
//! - Track how many canvas entities reference each key.
//!
//! # Invariants
//! - The ledger is a derived cache: for every key its count equals the
//!   number of stitches, backstitches and knots referencing that key, and
//!   it is reconstructible by rescanning the canvas.
//! - Zero-count palette entries stay in place until an explicit prune,
//!   so a floss can be pre-added before its first use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index into the document palette, shared by stitches, lines and knots.
pub type FlossKey = u32;

/// A thread color resolved from a named scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floss {
    pub name: String,
    /// Display color as a `#RRGGBB` hex string.
    pub color: String,
}

impl Floss {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Sentinel used when a decoded floss name is missing from the active
    /// scheme; keeps the load alive instead of discarding the file.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: "#000000".to_string(),
        }
    }
}

/// Per-document attributes attached to one palette floss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub floss: Floss,
    /// Symbol drawn in symbol view and printed charts.
    pub symbol: char,
    pub stitch_strands: u8,
    pub backstitch_strands: u8,
}

/// Key-ordered mapping from palette key to floss entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    entries: BTreeMap<FlossKey, PaletteEntry>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FlossKey, entry: PaletteEntry) -> Option<PaletteEntry> {
        self.entries.insert(key, entry)
    }

    pub fn get(&self, key: FlossKey) -> Option<&PaletteEntry> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: FlossKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlossKey, &PaletteEntry)> {
        self.entries.iter().map(|(key, entry)| (*key, entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = FlossKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the entries the predicate accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(FlossKey, &PaletteEntry) -> bool) {
        self.entries.retain(|key, entry| keep(*key, entry));
    }
}

/// Derived reference counts per palette key.
///
/// Counts are normalized: a key that drops to zero is removed, so two
/// ledgers over the same canvas always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLedger {
    counts: BTreeMap<FlossKey, u32>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: FlossKey, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += amount;
    }

    pub fn remove(&mut self, key: FlossKey, amount: u32) {
        if let Some(count) = self.counts.get_mut(&key) {
            debug_assert!(*count >= amount, "usage ledger underflow for key {key}");
            *count = count.saturating_sub(amount);
            if *count == 0 {
                self.counts.remove(&key);
            }
        } else {
            debug_assert!(amount == 0, "usage ledger underflow for key {key}");
        }
    }

    pub fn count(&self, key: FlossKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlossKey, u32)> + '_ {
        self.counts.iter().map(|(key, count)| (*key, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Floss, UsageLedger};

    #[test]
    fn ledger_counts_accumulate_and_normalize() {
        let mut ledger = UsageLedger::new();
        ledger.add(3, 2);
        ledger.add(3, 1);
        assert_eq!(ledger.count(3), 3);

        ledger.remove(3, 3);
        assert_eq!(ledger.count(3), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn normalized_ledgers_compare_equal() {
        let mut a = UsageLedger::new();
        a.add(1, 1);
        a.add(2, 1);
        a.remove(2, 1);

        let mut b = UsageLedger::new();
        b.add(1, 1);

        assert_eq!(a, b);
    }

    #[test]
    fn placeholder_floss_keeps_requested_name() {
        let floss = Floss::placeholder("DMC 310");
        assert_eq!(floss.name, "DMC 310");
        assert_eq!(floss.color, "#000000");
    }
}
