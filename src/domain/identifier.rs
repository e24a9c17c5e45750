//! The set of `(template, net)` names declared by a netlist.
//!
//! An [`IdentifierIndex`] is built once per netlist load and never mutated.
//! Reloading a netlist produces a brand-new index with a fresh
//! [`Generation`], which is how dependent caches know to drop their contents.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use indexmap::{IndexMap, IndexSet};
use non_empty_string::NonEmptyString;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Version stamp of an [`IdentifierIndex`].
///
/// Every index built in this process receives a strictly greater generation
/// than the ones built before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A net declared inside a template.
///
/// Both names are non-empty and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    template: NonEmptyString,
    net: NonEmptyString,
}

impl Identifier {
    /// Creates an identifier, returning `None` if either name is empty.
    #[must_use]
    pub fn new(template: impl Into<String>, net: impl Into<String>) -> Option<Self> {
        let template = NonEmptyString::new(template.into()).ok()?;
        let net = NonEmptyString::new(net.into()).ok()?;
        Some(Self { template, net })
    }

    /// The template (subcircuit) name.
    #[must_use]
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    /// The net name.
    #[must_use]
    pub fn net(&self) -> &str {
        self.net.as_str()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.template, self.net)
    }
}

/// An immutable, deduplicated, insertion-ordered set of [`Identifier`]s.
#[derive(Debug, Clone)]
pub struct IdentifierIndex {
    generation: Generation,
    identifiers: IndexSet<Identifier>,
    /// Positions into `identifiers`, grouped by template, ascending.
    by_template: IndexMap<String, Vec<usize>>,
}

impl IdentifierIndex {
    /// Builds an index from `(template, net)` pairs.
    ///
    /// Duplicates keep the position of their first occurrence. Pairs with an
    /// empty template or net are skipped.
    pub fn build<I, T, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, N)>,
        T: Into<String>,
        N: Into<String>,
    {
        let mut identifiers = IndexSet::new();
        let mut by_template: IndexMap<String, Vec<usize>> = IndexMap::new();

        for (template, net) in pairs {
            let (template, net) = (template.into(), net.into());
            let Some(identifier) = Identifier::new(template.clone(), net.clone()) else {
                tracing::debug!("Skipping identifier with empty name: '{template}:{net}'");
                continue;
            };
            let (position, inserted) = identifiers.insert_full(identifier);
            if inserted {
                by_template.entry(template).or_default().push(position);
            }
        }

        let index = Self {
            generation: Generation::next(),
            identifiers,
            by_template,
        };
        tracing::debug!(
            "Built identifier index {} with {} identifiers across {} templates",
            index.generation,
            index.len(),
            index.by_template.len()
        );
        index
    }

    /// The generation stamp of this index.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// All identifiers, in insertion order.
    #[must_use]
    pub const fn all(&self) -> &IndexSet<Identifier> {
        &self.identifiers
    }

    /// Iterates over all identifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.identifiers.iter()
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether the index holds no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Whether the exact `(template, net)` pair is declared.
    #[must_use]
    pub fn contains(&self, template: &str, net: &str) -> bool {
        Identifier::new(template, net).is_some_and(|id| self.identifiers.contains(&id))
    }

    /// Distinct template names in order of first appearance.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.by_template.keys().map(String::as_str)
    }

    /// Nets declared in `template`, in index order.
    ///
    /// Unknown templates yield nothing.
    pub fn nets_in<'a>(&'a self, template: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.template_members(template).map(Identifier::net)
    }

    /// Identifiers of one template, in index order.
    pub(crate) fn template_members<'a>(
        &'a self,
        template: &str,
    ) -> impl Iterator<Item = &'a Identifier> + 'a {
        self.by_template
            .get(template)
            .into_iter()
            .flatten()
            .filter_map(|&position| self.identifiers.get_index(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IdentifierIndex {
        IdentifierIndex::build([
            ("inv", "A"),
            ("inv", "Y"),
            ("nand2", "A"),
            ("inv", "A"),
            ("nand2", "B"),
        ])
    }

    #[test]
    fn build_deduplicates_and_keeps_first_position() {
        let index = sample();
        let names: Vec<String> = index.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["inv:A", "inv:Y", "nand2:A", "nand2:B"]);
    }

    #[test]
    fn empty_names_are_skipped() {
        let index = IdentifierIndex::build([("", "A"), ("inv", ""), ("inv", "Y")]);
        assert_eq!(index.len(), 1);
        assert!(index.contains("inv", "Y"));
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        let index = IdentifierIndex::build([("inv", "vdd"), ("inv", "VDD")]);
        assert_eq!(index.len(), 2);
        assert!(index.contains("inv", "VDD"));
        assert!(!index.contains("INV", "VDD"));
    }

    #[test]
    fn templates_and_nets_are_grouped() {
        let index = sample();
        assert_eq!(index.templates().collect::<Vec<_>>(), ["inv", "nand2"]);
        assert_eq!(index.nets_in("nand2").collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(index.nets_in("missing").count(), 0);
    }

    #[test]
    fn every_build_gets_a_newer_generation() {
        let first = sample();
        let second = sample();
        assert!(second.generation() > first.generation());
    }
}
