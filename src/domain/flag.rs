//! Per-line modifiers of an AF entry.
//!
//! Flags select literal or regular-expression interpretation for each half of
//! the specifier and mark electromigration (EM) / self-heating (SH)
//! relevance. Two spellings are understood:
//!
//! - one token per flag: `template-regexp net-regular _em _sh`
//! - the legacy compound token: `template-regexp_net-regular_sch_em_sh`

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A single line modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// The template part is a regular expression.
    TemplateRegex,
    /// The template part is literal text.
    TemplateLiteral,
    /// The net part is a regular expression.
    NetRegex,
    /// The net part is literal text.
    NetLiteral,
    /// Electromigration analysis applies.
    Em,
    /// Self-heating analysis applies.
    Sh,
}

impl Flag {
    /// All flags in canonical order.
    pub const ALL: [Self; 6] = [
        Self::TemplateRegex,
        Self::TemplateLiteral,
        Self::NetRegex,
        Self::NetLiteral,
        Self::Em,
        Self::Sh,
    ];

    /// The token spelling used in AF files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::TemplateRegex => "template-regexp",
            Self::TemplateLiteral => "template-regular",
            Self::NetRegex => "net-regexp",
            Self::NetLiteral => "net-regular",
            Self::Em => "_em",
            Self::Sh => "_sh",
        }
    }

    /// The flag that may not appear alongside this one.
    #[must_use]
    pub const fn exclusive_with(self) -> Option<Self> {
        match self {
            Self::TemplateRegex => Some(Self::TemplateLiteral),
            Self::TemplateLiteral => Some(Self::TemplateRegex),
            Self::NetRegex => Some(Self::NetLiteral),
            Self::NetLiteral => Some(Self::NetRegex),
            Self::Em | Self::Sh => None,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Flag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.token() == s)
            .ok_or_else(|| UnknownFlag(s.to_string()))
    }
}

/// A token that is not a recognised flag spelling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flag '{0}'")]
pub struct UnknownFlag(pub String);

/// Two mutually exclusive flags were both given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("flags '{0}' and '{1}' cannot be combined")]
pub struct ConflictingFlags(pub Flag, pub Flag);

/// A set of [`Flag`]s with the exclusivity rule enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(BTreeSet<Flag>);

impl FlagSet {
    /// An empty set: both parts literal, default modes.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a flag.
    ///
    /// Adding a flag that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictingFlags`] if the exclusive partner is present.
    pub fn insert(&mut self, flag: Flag) -> Result<(), ConflictingFlags> {
        if let Some(partner) = flag.exclusive_with() {
            if self.0.contains(&partner) {
                return Err(ConflictingFlags(partner, flag));
            }
        }
        self.0.insert(flag);
        Ok(())
    }

    /// Removes a flag, returning whether it was present.
    pub fn remove(&mut self, flag: Flag) -> bool {
        self.0.remove(&flag)
    }

    /// Whether `flag` is present.
    #[must_use]
    pub fn contains(&self, flag: Flag) -> bool {
        self.0.contains(&flag)
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flags in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        self.0.iter().copied()
    }

    /// Whether the template part is a regular expression.
    #[must_use]
    pub fn template_is_regex(&self) -> bool {
        self.contains(Flag::TemplateRegex)
    }

    /// Whether the net part is a regular expression.
    #[must_use]
    pub fn net_is_regex(&self) -> bool {
        self.contains(Flag::NetRegex)
    }

    /// Makes the regex/literal flag of one part agree with `is_regex`.
    ///
    /// A regex part always carries its regex flag. A literal part loses the
    /// regex flag but keeps an explicit literal flag if one was given.
    pub(crate) fn align_kind(&mut self, regex: Flag, literal: Flag, is_regex: bool) {
        if is_regex {
            self.0.remove(&literal);
            self.0.insert(regex);
        } else {
            self.0.remove(&regex);
        }
    }

    /// Whether EM analysis applies.
    ///
    /// With neither `_em` nor `_sh` given, both modes apply.
    #[must_use]
    pub fn em_enabled(&self) -> bool {
        self.contains(Flag::Em) || !self.contains(Flag::Sh)
    }

    /// Whether SH analysis applies.
    ///
    /// With neither `_em` nor `_sh` given, both modes apply.
    #[must_use]
    pub fn sh_enabled(&self) -> bool {
        self.contains(Flag::Sh) || !self.contains(Flag::Em)
    }

    /// Parses one whitespace-delimited flag token into `self`.
    ///
    /// Accepts the single-flag spellings as well as the legacy compound
    /// token.
    pub(crate) fn insert_token(&mut self, token: &str) -> Result<(), FlagError> {
        if let Ok(flag) = token.parse::<Flag>() {
            return Ok(self.insert(flag)?);
        }
        for flag in parse_compound(token)? {
            self.insert(flag)?;
        }
        Ok(())
    }

    /// Renders the flags in the requested style, or `None` if empty.
    #[must_use]
    pub fn render(&self, style: FlagStyle) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let rendered = match style {
            FlagStyle::Separate => self.iter().map(Flag::token).collect::<Vec<_>>().join(" "),
            FlagStyle::Compound => self.render_compound(),
        };
        Some(rendered)
    }

    fn render_compound(&self) -> String {
        let template = if self.template_is_regex() {
            Flag::TemplateRegex
        } else {
            Flag::TemplateLiteral
        };
        let net = if self.net_is_regex() {
            Flag::NetRegex
        } else {
            Flag::NetLiteral
        };
        let mut out = format!("{template}_{net}");
        if self.contains(Flag::Em) || self.contains(Flag::Sh) {
            out.push_str("_sch");
            if self.contains(Flag::Em) {
                out.push_str("_em");
            }
            if self.contains(Flag::Sh) {
                out.push_str("_sh");
            }
        }
        out
    }
}

/// Errors from interpreting a flag token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    /// The token is not a flag.
    #[error(transparent)]
    Unknown(#[from] UnknownFlag),
    /// The token contradicts a flag given earlier.
    #[error(transparent)]
    Conflict(#[from] ConflictingFlags),
}

/// How flags are written back to text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStyle {
    /// One token per flag (`template-regexp net-regular _em`).
    #[default]
    Separate,
    /// A single legacy token (`template-regexp_net-regular_sch_em`).
    Compound,
}

/// Splits a legacy compound token such as `template-regular-net-regexp_sch_sh`.
fn parse_compound(token: &str) -> Result<Vec<Flag>, UnknownFlag> {
    let unknown = || UnknownFlag(token.to_string());

    // Old files wrote a bare `regexp` to mean "the net is a pattern".
    if token == "regexp" {
        return Ok(vec![Flag::NetRegex]);
    }
    if !token.contains('_') && !token.contains('-') {
        return Err(unknown());
    }

    let mut flags = Vec::new();
    for piece in token.split('_').filter(|piece| !piece.is_empty()) {
        match piece {
            "sch" => {}
            "em" => flags.push(Flag::Em),
            "sh" => flags.push(Flag::Sh),
            _ => {
                let words: Vec<&str> = piece.split('-').collect();
                if words.len() % 2 != 0 {
                    return Err(unknown());
                }
                for pair in words.chunks(2) {
                    let flag = match (pair[0], pair[1]) {
                        ("template", "regexp") => Flag::TemplateRegex,
                        ("template", "regular") => Flag::TemplateLiteral,
                        ("net", "regexp") => Flag::NetRegex,
                        ("net", "regular") => Flag::NetLiteral,
                        _ => return Err(unknown()),
                    };
                    flags.push(flag);
                }
            }
        }
    }

    if flags.is_empty() {
        Err(unknown())
    } else {
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn parsed(tokens: &[&str]) -> Result<FlagSet, FlagError> {
        let mut set = FlagSet::new();
        for token in tokens {
            set.insert_token(token)?;
        }
        Ok(set)
    }

    #[test_case("template-regexp", Flag::TemplateRegex)]
    #[test_case("template-regular", Flag::TemplateLiteral)]
    #[test_case("net-regexp", Flag::NetRegex)]
    #[test_case("net-regular", Flag::NetLiteral)]
    #[test_case("_em", Flag::Em)]
    #[test_case("_sh", Flag::Sh)]
    fn single_tokens(token: &str, expected: Flag) {
        assert_eq!(token.parse::<Flag>(), Ok(expected));
        assert_eq!(expected.to_string(), token);
    }

    #[test]
    fn exclusive_pairs_conflict() {
        let err = parsed(&["template-regexp", "template-regular"]).unwrap_err();
        assert_eq!(
            err,
            FlagError::Conflict(ConflictingFlags(Flag::TemplateRegex, Flag::TemplateLiteral))
        );
        assert!(parsed(&["net-regular", "net-regexp"]).is_err());
    }

    #[test]
    fn repeated_flags_collapse() {
        let set = parsed(&["_em", "_em", "net-regexp", "net-regexp"]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), [Flag::NetRegex, Flag::Em]);
    }

    #[test_case("template-regexp_net-regular_sch_em", &[Flag::TemplateRegex, Flag::NetLiteral, Flag::Em]; "underscore joined")]
    #[test_case("template-regular-net-regexp_sch_sh", &[Flag::TemplateLiteral, Flag::NetRegex, Flag::Sh]; "hyphen joined")]
    #[test_case("net-regexp_template-regexp_sch_em_sh", &[Flag::TemplateRegex, Flag::NetRegex, Flag::Em, Flag::Sh]; "net first")]
    #[test_case("regexp", &[Flag::NetRegex]; "bare regexp")]
    fn legacy_compound_tokens(token: &str, expected: &[Flag]) {
        let set = parsed(&[token]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), expected);
    }

    #[test_case("fast")]
    #[test_case("template-fuzzy")]
    #[test_case("net_")]
    #[test_case("_sch")]
    fn unknown_tokens(token: &str) {
        assert!(matches!(parsed(&[token]), Err(FlagError::Unknown(_))));
    }

    #[test]
    fn modes_default_to_both() {
        let none = FlagSet::new();
        assert!(none.em_enabled() && none.sh_enabled());

        let em_only = parsed(&["_em"]).unwrap();
        assert!(em_only.em_enabled());
        assert!(!em_only.sh_enabled());
    }

    #[test]
    fn render_styles() {
        let set = parsed(&["_sh", "net-regexp", "template-regular"]).unwrap();
        assert_eq!(
            set.render(FlagStyle::Separate).as_deref(),
            Some("template-regular net-regexp _sh")
        );
        assert_eq!(
            set.render(FlagStyle::Compound).as_deref(),
            Some("template-regular_net-regexp_sch_sh")
        );
        assert_eq!(FlagSet::new().render(FlagStyle::Compound), None);
    }

    #[test]
    fn compound_rendering_parses_back() {
        let set = parsed(&["template-regexp", "_em", "_sh"]).unwrap();
        let token = set.render(FlagStyle::Compound).unwrap();
        let reparsed = parsed(&[&token]).unwrap();
        assert!(reparsed.template_is_regex());
        assert!(reparsed.contains(Flag::Em) && reparsed.contains(Flag::Sh));
    }
}
