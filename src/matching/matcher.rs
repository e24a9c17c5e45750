use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use regex::Regex;

use super::bus::{self, Expansion};
use crate::domain::{Config, Generation, Identifier, IdentifierIndex, MatchSpec, Spec, SpecPart};

/// A regular expression in a specifier failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {part} pattern '{spec}': {detail}")]
pub struct PatternSyntaxError {
    /// Which half of the specifier held the pattern.
    pub part: SpecPart,
    /// The pattern text as written.
    pub spec: String,
    /// The compiler's explanation.
    pub detail: String,
}

/// The identifiers selected by one [`MatchSpec`], in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    identifiers: Vec<Identifier>,
}

impl MatchResult {
    /// The matched identifiers.
    #[must_use]
    pub fn as_slice(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// Iterates over the matched identifiers.
    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.identifiers.iter()
    }

    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Distinct templates among the matches, in order of first match.
    #[must_use]
    pub fn templates(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.identifiers
            .iter()
            .map(Identifier::template)
            .filter(|template| seen.insert(*template))
            .collect()
    }

    /// The matches as `template:net` strings.
    #[must_use]
    pub fn qualified_names(&self) -> Vec<String> {
        self.identifiers.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Work counters, for observing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Regular expressions compiled.
    pub compilations: usize,
    /// Full passes over an identifier index.
    pub scans: usize,
    /// Queries answered from the cache.
    pub cache_hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    generation: Generation,
    template: Option<String>,
    net: String,
}

impl CacheKey {
    fn new(generation: Generation, spec: &MatchSpec) -> Self {
        Self {
            generation,
            template: spec.template().map(Spec::canonical),
            net: spec.net().canonical(),
        }
    }
}

type Outcome = Result<Arc<MatchResult>, PatternSyntaxError>;

/// Resolves `{template:net}` selectors against an [`IdentifierIndex`].
///
/// Results, including pattern syntax errors, are memoized per index
/// generation. Querying with an index of a different generation drops every
/// cached result first. Compiled regular expressions do not depend on the
/// index and are kept for the lifetime of the matcher.
#[derive(Debug)]
pub struct PatternMatcher {
    generation: Option<Generation>,
    results: HashMap<CacheKey, Outcome>,
    /// Anchored regexes by pattern source, or the compile error text.
    regexes: HashMap<String, Result<Regex, String>>,
    expand_bus_notation: bool,
    stats: MatchStats,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    /// A matcher with bus-notation expansion enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// A matcher honouring the relevant configuration keys.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self {
            generation: None,
            results: HashMap::new(),
            regexes: HashMap::new(),
            expand_bus_notation: config.expand_bus_notation,
            stats: MatchStats::default(),
        }
    }

    /// Returns the identifiers of `index` selected by `spec`.
    ///
    /// Literal parts match names exactly; regex parts must match the whole
    /// name. Repeated queries for the same spec and index generation return
    /// the same shared result without rescanning.
    ///
    /// # Errors
    ///
    /// Returns [`PatternSyntaxError`] if a regex part does not compile. The
    /// failure is cached like a result.
    pub fn find_matches(&mut self, spec: &MatchSpec, index: &IdentifierIndex) -> Outcome {
        self.sync_generation(index.generation());

        let key = CacheKey::new(index.generation(), spec);
        if let Some(cached) = self.results.get(&key) {
            self.stats.cache_hits += 1;
            tracing::trace!("Cache hit for {spec}");
            return cached.clone();
        }

        let outcome = self.compute(spec, index).map(Arc::new);
        match &outcome {
            Ok(result) => tracing::trace!("{spec} matched {} identifiers", result.len()),
            Err(e) => tracing::warn!("{e}"),
        }
        self.results.insert(key, outcome.clone());
        outcome
    }

    /// Work done so far.
    #[must_use]
    pub const fn stats(&self) -> MatchStats {
        self.stats
    }

    /// Number of memoized results for the current generation.
    #[must_use]
    pub fn cached_results(&self) -> usize {
        self.results.len()
    }

    /// Drops every memoized result and compiled pattern.
    pub fn clear(&mut self) {
        self.results.clear();
        self.regexes.clear();
        self.generation = None;
    }

    fn sync_generation(&mut self, generation: Generation) {
        if self.generation == Some(generation) {
            return;
        }
        if !self.results.is_empty() {
            tracing::debug!(
                "Identifier index changed to generation {generation}, dropping {} cached results",
                self.results.len()
            );
        }
        self.results.clear();
        self.generation = Some(generation);
    }

    fn compute(
        &mut self,
        spec: &MatchSpec,
        index: &IdentifierIndex,
    ) -> Result<MatchResult, PatternSyntaxError> {
        let template = match spec.template() {
            Some(template) => self.predicate(template, SpecPart::Template)?,
            None => Predicate::Any,
        };
        let net = self.predicate(spec.net(), SpecPart::Net)?;

        self.stats.scans += 1;
        let identifiers = if let Predicate::Exact(name) = template {
            index
                .template_members(name)
                .filter(|id| net.accepts(id.net()))
                .cloned()
                .collect()
        } else {
            index
                .iter()
                .filter(|id| template.accepts(id.template()) && net.accepts(id.net()))
                .cloned()
                .collect()
        };

        Ok(MatchResult { identifiers })
    }

    fn predicate<'s>(
        &mut self,
        spec: &'s Spec,
        part: SpecPart,
    ) -> Result<Predicate<'s>, PatternSyntaxError> {
        match spec {
            Spec::Literal(text) => Ok(self.literal_predicate(text.as_str())),
            Spec::Regex(pattern) => {
                self.compile(pattern.as_str())
                    .map(Predicate::Pattern)
                    .map_err(|detail| PatternSyntaxError {
                        part,
                        spec: pattern.to_string(),
                        detail,
                    })
            }
        }
    }

    fn literal_predicate<'s>(&self, text: &'s str) -> Predicate<'s> {
        if !self.expand_bus_notation {
            return Predicate::Exact(text);
        }
        match bus::expand(text, bus::EXPANSION_LIMIT) {
            Expansion::NotBus => Predicate::Exact(text),
            Expansion::Names(names) => {
                let mut names: HashSet<String> = names.into_iter().collect();
                names.insert(text.to_string());
                Predicate::OneOf(names)
            }
            Expansion::TooLarge => {
                tracing::warn!(
                    "Bus range in '{text}' expands to more than {} names, matching it literally",
                    bus::EXPANSION_LIMIT
                );
                Predicate::Exact(text)
            }
        }
    }

    fn compile(&mut self, pattern: &str) -> Result<Regex, String> {
        if let Some(compiled) = self.regexes.get(pattern) {
            return compiled.clone();
        }

        self.stats.compilations += 1;
        // The pattern must stand on its own before it is wrapped, or text
        // like `a)|(?:b` would close the group and escape the anchors.
        let compiled = Regex::new(pattern)
            .and_then(|_| Regex::new(&format!("^(?:{pattern})$")))
            .map_err(|e| e.to_string());
        self.regexes.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

enum Predicate<'s> {
    Any,
    Exact(&'s str),
    OneOf(HashSet<String>),
    Pattern(Regex),
}

impl Predicate<'_> {
    fn accepts(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(text) => *text == name,
            Self::OneOf(names) => names.contains(name),
            Self::Pattern(regex) => regex.is_match(name),
        }
    }
}
