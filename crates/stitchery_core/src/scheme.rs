//! Thread-scheme lookup seam.
//!
//! # Responsibility
//! - Resolve stored floss names back into live [`Floss`] values during
//!   decode. Scheme libraries themselves live outside this crate.
//!
//! # Invariants
//! - A missing name degrades to a placeholder floss and a logged warning;
//!   it never fails the load.

use crate::model::palette::Floss;
use log::warn;
use std::collections::BTreeMap;

/// Lookup service mapping `(scheme name, floss name)` to a floss.
pub trait FlossSchemes {
    fn find(&self, scheme: &str, floss: &str) -> Option<Floss>;
}

/// Resolves a floss name, falling back to a placeholder when the active
/// scheme does not know it.
pub fn resolve_or_placeholder(schemes: &dyn FlossSchemes, scheme: &str, name: &str) -> Floss {
    match schemes.find(scheme, name) {
        Some(floss) => floss,
        None => {
            warn!(
                "event=floss_missing module=scheme status=degraded scheme={scheme} floss={name}"
            );
            Floss::placeholder(name)
        }
    }
}

/// In-memory scheme catalog for tests and embedding hosts without a real
/// scheme library.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemes {
    schemes: BTreeMap<String, BTreeMap<String, Floss>>,
}

impl MemorySchemes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scheme: impl Into<String>, floss: Floss) {
        self.schemes
            .entry(scheme.into())
            .or_default()
            .insert(floss.name.clone(), floss);
    }

    /// Builder-style variant of [`MemorySchemes::insert`].
    pub fn with_floss(
        mut self,
        scheme: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.insert(scheme, Floss::new(name, color));
        self
    }
}

impl FlossSchemes for MemorySchemes {
    fn find(&self, scheme: &str, floss: &str) -> Option<Floss> {
        self.schemes.get(scheme)?.get(floss).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_or_placeholder, FlossSchemes, MemorySchemes};

    #[test]
    fn finds_flosses_per_scheme() {
        let schemes = MemorySchemes::new()
            .with_floss("DMC", "310", "#000000")
            .with_floss("Anchor", "403", "#0A0A0A");

        assert_eq!(
            schemes.find("DMC", "310").map(|f| f.color),
            Some("#000000".to_string())
        );
        assert!(schemes.find("DMC", "403").is_none());
    }

    #[test]
    fn missing_name_yields_placeholder() {
        let schemes = MemorySchemes::new();
        let floss = resolve_or_placeholder(&schemes, "DMC", "666");
        assert_eq!(floss.name, "666");
        assert_eq!(floss.color, "#000000");
    }
}
