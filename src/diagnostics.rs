//! Whole-document checks against a netlist.
//!
//! [`diagnose`] reports every line that is broken or selects nothing, and
//! [`find_conflicts`] reports identifiers that several entries disagree about.
//! Conflicts are only reported; no entry is given precedence over another.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    document::Document,
    domain::{ConfigLine, Entry, Identifier, IdentifierIndex, LineError},
    matching::{MatchResult, PatternMatcher, PatternSyntaxError},
};

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The line cannot be used as written.
    Error,
    /// The line is valid but probably not what was meant.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A problem found on one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line_number: usize,
    /// 1-based column, when the problem has a position.
    pub column: Option<usize>,
    /// How serious it is.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: line {}", self.severity, self.line_number)?;
        if let Some(column) = self.column {
            write!(f, ", column {column}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// What an entry resolves to against the current index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    /// At least one identifier matches.
    Valid(usize),
    /// The entry is well-formed but selects nothing.
    NoMatches,
    /// A regex part does not compile.
    BadPattern(PatternSyntaxError),
}

/// Resolves one entry.
pub fn line_status(
    entry: &Entry,
    matcher: &mut PatternMatcher,
    index: &IdentifierIndex,
) -> LineStatus {
    match matcher.find_matches(entry.spec(), index) {
        Ok(result) if result.is_empty() => LineStatus::NoMatches,
        Ok(result) => LineStatus::Valid(result.len()),
        Err(e) => LineStatus::BadPattern(e),
    }
}

/// Checks every line of `document`, in order.
pub fn diagnose(
    document: &Document,
    matcher: &mut PatternMatcher,
    index: &IdentifierIndex,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for line in document.lines() {
        if let Some(error) = line.error() {
            diagnostics.push(invalid_line(error));
            continue;
        }
        let Some(entry) = line.entry() else {
            continue;
        };
        match line_status(entry, matcher, index) {
            LineStatus::Valid(_) => {}
            LineStatus::NoMatches => diagnostics.push(Diagnostic {
                line_number: line.line_number(),
                column: None,
                severity: Severity::Warning,
                message: format!("{} matches no identifier", entry.spec()),
            }),
            LineStatus::BadPattern(e) => diagnostics.push(Diagnostic {
                line_number: line.line_number(),
                column: None,
                severity: Severity::Error,
                message: e.to_string(),
            }),
        }
    }

    tracing::debug!("Found {} diagnostics", diagnostics.len());
    diagnostics
}

fn invalid_line(error: &LineError) -> Diagnostic {
    let message = match error {
        LineError::Parse(e) => e.reason.to_string(),
        LineError::Validation(e) => e.reason.to_string(),
    };
    Diagnostic {
        line_number: error.line_number(),
        column: Some(error.column()),
        severity: Severity::Error,
        message,
    }
}

/// One entry's claim on an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assignment {
    /// Line of the entry.
    pub line_number: usize,
    /// The entry's activity factor.
    pub activity_factor: f64,
    /// Whether the entry enables EM.
    pub em: bool,
    /// Whether the entry enables SH.
    pub sh: bool,
}

impl Assignment {
    fn new(line: &ConfigLine, entry: &Entry) -> Self {
        Self {
            line_number: line.line_number(),
            activity_factor: entry.activity_factor(),
            em: entry.em_enabled(),
            sh: entry.sh_enabled(),
        }
    }

    fn agrees_with(&self, other: &Self) -> bool {
        self.activity_factor.to_bits() == other.activity_factor.to_bits()
            && self.em == other.em
            && self.sh == other.sh
    }
}

/// An identifier targeted by entries that disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    /// The contested identifier.
    #[serde(serialize_with = "serialize_identifier")]
    pub identifier: Identifier,
    /// Every entry that targets it, in document order.
    pub assignments: Vec<Assignment>,
}

impl Conflict {
    /// Line numbers of the entries involved.
    pub fn line_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.assignments.iter().map(|a| a.line_number)
    }
}

fn serialize_identifier<S: serde::Serializer>(
    identifier: &Identifier,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(identifier)
}

/// Lists identifiers that two or more entries target with a different
/// activity factor or different EM/SH modes.
///
/// Entries with a bad pattern are skipped; [`diagnose`] reports them.
pub fn find_conflicts(
    document: &Document,
    matcher: &mut PatternMatcher,
    index: &IdentifierIndex,
) -> Vec<Conflict> {
    let mut results: Vec<(Assignment, Arc<MatchResult>)> = Vec::new();

    for line in document.lines() {
        let Some(entry) = line.entry() else {
            continue;
        };
        if let Ok(result) = matcher.find_matches(entry.spec(), index) {
            results.push((Assignment::new(line, entry), result));
        }
    }

    let mut targets: IndexMap<&Identifier, Vec<Assignment>> = IndexMap::new();
    for (assignment, result) in &results {
        for identifier in result.iter() {
            targets.entry(identifier).or_default().push(*assignment);
        }
    }

    let conflicts: Vec<Conflict> = targets
        .into_iter()
        .filter(|(_, assignments)| {
            assignments
                .split_first()
                .is_some_and(|(first, rest)| rest.iter().any(|a| !a.agrees_with(first)))
        })
        .map(|(identifier, assignments)| Conflict {
            identifier: identifier.clone(),
            assignments,
        })
        .collect();

    tracing::debug!("Found {} conflicting identifiers", conflicts.len());
    conflicts
}
