//! Editing core for Activity Factor (AF) configuration files.
//!
//! An AF file assigns activity factors to the nets of a SPICE netlist, one
//! `{template:net} value [flags]` entry per line. This crate provides the
//! pieces an editor needs:
//!
//! - [`IdentifierIndex`]: the `(template, net)` names a netlist declares.
//! - [`PatternMatcher`]: resolves an entry's selector against an index, with
//!   memoized results.
//! - [`ConfigLine`]: total parsing and canonical serialization of one line.
//! - [`Document`]: an undoable, line-oriented buffer with a lazily rendered
//!   view.
//!
//! ```
//! use lotus::{Document, IdentifierIndex, PatternMatcher};
//!
//! let index = IdentifierIndex::build([("anytpl", "CLK"), ("anytpl", "CLKN")]);
//! let document = Document::load("{:CLK} 1.0\n");
//! let entry = document.line(0).and_then(|line| line.entry()).unwrap();
//!
//! let mut matcher = PatternMatcher::new();
//! let matches = matcher.find_matches(entry.spec(), &index).unwrap();
//! assert_eq!(matches.qualified_names(), ["anytpl:CLK"]);
//! ```

pub mod diagnostics;
pub use diagnostics::{Conflict, Diagnostic, LineStatus, Severity, diagnose, find_conflicts};

pub mod document;
pub use document::{Command, Document, DocumentEvent, HistoryStep, IndexError};

pub mod domain;
pub use domain::{Config, ConfigLine, Entry, Identifier, IdentifierIndex, LineKind, MatchSpec, Spec};

pub mod matching;
pub use matching::{MatchResult, PatternMatcher, PatternSyntaxError};

/// Filesystem access for AF files and netlists.
pub mod storage;
