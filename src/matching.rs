//! Resolution of `{template:net}` selectors against an identifier index.

mod bus;
mod matcher;

pub use bus::EXPANSION_LIMIT;
pub use matcher::{MatchResult, MatchStats, PatternMatcher, PatternSyntaxError};
