//! Domain models for AF configuration files.
//!
//! This module contains the core domain types: the identifiers declared by a
//! netlist, the `{template:net}` selectors that target them, and the parsed
//! form of a configuration line.

mod config;
pub use config::{Config, ConfigError};

/// Flags that modify an AF entry.
pub mod flag;
pub use flag::{Flag, FlagSet, FlagStyle};

pub mod identifier;
pub use identifier::{Generation, Identifier, IdentifierIndex};

/// Parsing and serialization of single AF lines.
pub mod line;
pub use line::{ConfigLine, Entry, LineError, LineKind, ParseError, ValidationError};

mod spec;
pub use spec::{EmptySpecError, MatchSpec, Spec, SpecPart};
