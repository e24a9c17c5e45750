//! One line of an Activity Factor (AF) configuration file.
//!
//! An entry line has the shape
//!
//! ```text
//! {template:net} activity_factor [flag ...]
//! ```
//!
//! Lines starting with `#` are comments and whitespace-only lines are blank.
//! Parsing is total: anything else becomes an [`LineKind::Invalid`] record
//! that keeps the raw text together with the reason it was rejected.

use std::fmt;

use crate::domain::{
    flag::{Flag, FlagError, FlagSet, FlagStyle},
    spec::{MatchSpec, Spec},
};

/// A parsed line together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLine {
    line_number: usize,
    raw: String,
    kind: LineKind,
}

/// The structured content of a [`ConfigLine`].
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// Empty or whitespace-only.
    Blank,
    /// A `#` comment.
    Comment,
    /// A `{template:net}` entry.
    Entry(Entry),
    /// Text that failed to parse or validate.
    Invalid(LineError),
}

/// A well-formed AF entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    spec: MatchSpec,
    activity_factor: f64,
    flags: FlagSet,
}

impl Entry {
    /// Builds an entry.
    ///
    /// The regex/literal flags are brought in line with the kinds of the
    /// specs: a regex part gets its regex flag, a literal part loses it.
    ///
    /// # Errors
    ///
    /// Fails if the activity factor is outside `[0, 1]` or the template text
    /// contains a `:`, which could not be written back unambiguously.
    pub fn new(
        spec: MatchSpec,
        activity_factor: f64,
        mut flags: FlagSet,
    ) -> Result<Self, ValidationReason> {
        if !(0.0..=1.0).contains(&activity_factor) {
            return Err(ValidationReason::ActivityFactorOutOfRange(activity_factor));
        }
        if let Some(template) = spec.template() {
            if template.text().contains(':') {
                return Err(ValidationReason::ColonInTemplate(template.text().to_string()));
            }
            flags.align_kind(Flag::TemplateRegex, Flag::TemplateLiteral, template.is_regex());
        }
        flags.align_kind(Flag::NetRegex, Flag::NetLiteral, spec.net().is_regex());

        Ok(Self {
            spec,
            activity_factor,
            flags,
        })
    }

    /// The `{template:net}` selector.
    #[must_use]
    pub const fn spec(&self) -> &MatchSpec {
        &self.spec
    }

    /// The activity factor, within `[0, 1]`.
    #[must_use]
    pub const fn activity_factor(&self) -> f64 {
        self.activity_factor
    }

    /// The line's flags.
    #[must_use]
    pub const fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Whether electromigration analysis applies to the matched nets.
    #[must_use]
    pub fn em_enabled(&self) -> bool {
        self.flags.em_enabled()
    }

    /// Whether self-heating analysis applies to the matched nets.
    #[must_use]
    pub fn sh_enabled(&self) -> bool {
        self.flags.sh_enabled()
    }

    /// Writes the entry in canonical form.
    #[must_use]
    pub fn to_text(&self, style: FlagStyle) -> String {
        let template = self.spec.template().map_or("", Spec::text);
        let mut text = format!(
            "{{{template}:{}}} {}",
            self.spec.net().text(),
            format_activity_factor(self.activity_factor)
        );
        if let Some(flags) = self.flags.render(style) {
            text.push(' ');
            text.push_str(&flags);
        }
        text
    }
}

/// Why a line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseReason {
    /// The line is neither blank, a comment, nor starts with `{`.
    #[error("expected a '{{template:net}}' specifier or a '#' comment")]
    MissingOpenBrace,
    /// The specifier's braces never close.
    #[error("unclosed '{{' in specifier")]
    UnclosedBrace,
    /// The net part of the specifier is empty.
    #[error("the net part of the specifier is empty")]
    EmptyNet,
    /// Something other than whitespace follows the closing brace.
    #[error("expected whitespace after the specifier")]
    MissingSeparator,
    /// Nothing follows the specifier.
    #[error("missing activity factor")]
    MissingActivityFactor,
    /// The activity factor is not a number.
    #[error("activity factor '{0}' is not a number")]
    InvalidActivityFactor(String),
    /// A trailing token is not a valid flag.
    #[error(transparent)]
    Flag(#[from] FlagError),
}

/// A line that does not match the AF grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_number}, column {column}: {reason}")]
pub struct ParseError {
    /// 1-based line number.
    pub line_number: usize,
    /// 1-based character column where the problem starts.
    pub column: usize,
    /// What went wrong.
    pub reason: ParseReason,
}

/// Why a structurally valid entry is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    /// The activity factor is outside `[0, 1]`.
    #[error("activity factor {0} is outside [0, 1]")]
    ActivityFactorOutOfRange(f64),
    /// The template text contains a `:`.
    #[error("template '{0}' must not contain ':'")]
    ColonInTemplate(String),
}

/// An entry that parses but violates a semantic constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line_number}, column {column}: {reason}")]
pub struct ValidationError {
    /// 1-based line number.
    pub line_number: usize,
    /// 1-based character column of the offending value.
    pub column: usize,
    /// What went wrong.
    pub reason: ValidationReason,
}

/// Either kind of line-level failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    /// The text does not match the grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The text parses but is semantically invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl LineError {
    /// 1-based line number the error refers to.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Parse(e) => e.line_number,
            Self::Validation(e) => e.line_number,
        }
    }

    /// 1-based column the error refers to.
    #[must_use]
    pub const fn column(&self) -> usize {
        match self {
            Self::Parse(e) => e.column,
            Self::Validation(e) => e.column,
        }
    }
}

impl ConfigLine {
    /// Parses one line of text. Never fails: bad input becomes
    /// [`LineKind::Invalid`].
    #[must_use]
    pub fn parse(raw: &str, line_number: usize) -> Self {
        let trimmed = raw.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else {
            match parse_entry(raw, line_number) {
                Ok(entry) => LineKind::Entry(entry),
                Err(error) => LineKind::Invalid(error),
            }
        };

        Self {
            line_number,
            raw: raw.to_string(),
            kind,
        }
    }

    /// Wraps an entry, using its canonical text as the raw text.
    #[must_use]
    pub fn from_entry(entry: Entry, line_number: usize) -> Self {
        Self {
            line_number,
            raw: entry.to_text(FlagStyle::default()),
            kind: LineKind::Entry(entry),
        }
    }

    /// The line number this record was parsed at.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// The original text.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The structured content.
    #[must_use]
    pub const fn kind(&self) -> &LineKind {
        &self.kind
    }

    /// The entry, if this line is one.
    #[must_use]
    pub const fn entry(&self) -> Option<&Entry> {
        match &self.kind {
            LineKind::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// The parse or validation error, if the line is invalid.
    #[must_use]
    pub const fn error(&self) -> Option<&LineError> {
        match &self.kind {
            LineKind::Invalid(error) => Some(error),
            _ => None,
        }
    }

    /// Whether this is a comment line.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self.kind, LineKind::Comment)
    }

    /// Short description for display next to the line.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match &self.kind {
            LineKind::Blank => Some("Empty line".to_string()),
            LineKind::Comment => Some("Comment line".to_string()),
            LineKind::Entry(_) => None,
            LineKind::Invalid(LineError::Parse(e)) => {
                Some(format!("column {}: {}", e.column, e.reason))
            }
            LineKind::Invalid(LineError::Validation(e)) => {
                Some(format!("column {}: {}", e.column, e.reason))
            }
        }
    }

    /// Moves the line, keeping any error's position in step.
    pub(crate) const fn renumber(&mut self, line_number: usize) {
        self.line_number = line_number;
        match &mut self.kind {
            LineKind::Invalid(LineError::Parse(e)) => e.line_number = line_number,
            LineKind::Invalid(LineError::Validation(e)) => e.line_number = line_number,
            LineKind::Blank | LineKind::Comment | LineKind::Entry(_) => {}
        }
    }

    /// Comments the line out, or uncomments it if it is a comment.
    #[must_use]
    pub fn toggle_comment(&self) -> Self {
        let text = if self.is_comment() {
            self.raw
                .trim_start()
                .trim_start_matches('#')
                .trim_start()
                .to_string()
        } else {
            format!("# {}", self.raw)
        };
        Self::parse(&text, self.line_number)
    }

    /// Writes the line back to text.
    ///
    /// Entries are written canonically; every other line verbatim.
    #[must_use]
    pub fn serialize(&self, style: FlagStyle) -> String {
        match &self.kind {
            LineKind::Blank => String::new(),
            LineKind::Entry(entry) => entry.to_text(style),
            LineKind::Comment | LineKind::Invalid(_) => self.raw.clone(),
        }
    }
}

impl fmt::Display for ConfigLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(FlagStyle::default()))
    }
}

/// Parses one line of text. See [`ConfigLine::parse`].
#[must_use]
pub fn parse(raw: &str, line_number: usize) -> ConfigLine {
    ConfigLine::parse(raw, line_number)
}

/// Writes one line back to text with one token per flag.
#[must_use]
pub fn serialize(line: &ConfigLine) -> String {
    line.serialize(FlagStyle::default())
}

fn parse_entry(raw: &str, line_number: usize) -> Result<Entry, LineError> {
    let parse_error = |offset: usize, reason: ParseReason| ParseError {
        line_number,
        column: column_of(raw, offset),
        reason,
    };

    let start = raw.len() - raw.trim_start().len();
    let body = &raw[start..];
    if !body.starts_with('{') {
        return Err(parse_error(start, ParseReason::MissingOpenBrace).into());
    }
    let close = closing_brace(body).ok_or_else(|| parse_error(start, ParseReason::UnclosedBrace))?;

    let inner = &body[1..close];
    let (template, net) = match selector_colon(inner) {
        Some(colon) => (inner[..colon].trim(), inner[colon + 1..].trim()),
        None => ("", inner.trim()),
    };
    if net.is_empty() {
        return Err(parse_error(start + 1, ParseReason::EmptyNet).into());
    }

    let after = start + close + 1;
    let rest = &raw[after..];
    if rest.trim().is_empty() {
        return Err(parse_error(after, ParseReason::MissingActivityFactor).into());
    }
    if !rest.starts_with(char::is_whitespace) {
        return Err(parse_error(after, ParseReason::MissingSeparator).into());
    }

    let mut tokens = tokens(rest).into_iter().map(|(offset, token)| (after + offset, token));
    let Some((af_offset, af_token)) = tokens.next() else {
        return Err(parse_error(after, ParseReason::MissingActivityFactor).into());
    };
    let activity_factor: f64 = af_token.parse().map_err(|_| {
        parse_error(
            af_offset,
            ParseReason::InvalidActivityFactor(af_token.to_string()),
        )
    })?;

    let mut flags = FlagSet::new();
    for (offset, token) in tokens {
        flags
            .insert_token(token)
            .map_err(|e| parse_error(offset, ParseReason::Flag(e)))?;
    }

    let validation_error = |offset: usize, reason: ValidationReason| ValidationError {
        line_number,
        column: column_of(raw, offset),
        reason,
    };

    // The specs were checked non-empty above.
    let template = if template.is_empty() {
        None
    } else {
        Spec::new(template, flags.template_is_regex()).ok()
    };
    let net = Spec::new(net, flags.net_is_regex())
        .map_err(|_| parse_error(start + 1, ParseReason::EmptyNet))?;

    Entry::new(MatchSpec::new(template, net), activity_factor, flags).map_err(|reason| {
        let offset = match reason {
            ValidationReason::ActivityFactorOutOfRange(_) => af_offset,
            ValidationReason::ColonInTemplate(_) => start + 1,
        };
        validation_error(offset, reason).into()
    })
}

/// Byte offset of the `}` that closes the leading `{`.
///
/// Nested braces (regex quantifiers) are balanced and backslash escapes are
/// skipped.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offset of the colon separating template from net.
///
/// Colons inside parentheses or brackets belong to the pattern, as in
/// `(?i:inv)` or the bus range `data[0:7]`.
fn selector_colon(inner: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(begin) = start.take() {
                out.push((begin, &text[begin..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(begin) = start {
        out.push((begin, &text[begin..]));
    }
    out
}

fn column_of(raw: &str, byte_offset: usize) -> usize {
    raw.get(..byte_offset).map_or(1, |prefix| prefix.chars().count() + 1)
}

fn format_activity_factor(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn entry(raw: &str) -> Entry {
        match ConfigLine::parse(raw, 1).kind {
            LineKind::Entry(entry) => entry,
            other => panic!("expected an entry for {raw:?}, got {other:?}"),
        }
    }

    fn error(raw: &str) -> LineError {
        ConfigLine::parse(raw, 7)
            .error()
            .cloned()
            .unwrap_or_else(|| panic!("expected {raw:?} to be invalid"))
    }

    #[test]
    fn parses_full_entry() {
        let e = entry("{tpl:VDD} 0.5 net-regular");
        assert_eq!(e.spec().template(), Some(&Spec::literal("tpl").unwrap()));
        assert_eq!(e.spec().net(), &Spec::literal("VDD").unwrap());
        assert!((e.activity_factor() - 0.5).abs() < f64::EPSILON);
        assert!(e.flags().contains(Flag::NetLiteral));
    }

    #[test]
    fn empty_template_means_any() {
        let e = entry("{:CLK} 1.0");
        assert_eq!(e.spec().template(), None);
        assert_eq!(e.spec().net().text(), "CLK");
    }

    #[test]
    fn colonless_specifier_is_accepted() {
        assert_eq!(entry("{CLK} 1.0"), entry("{:CLK} 1.0"));
    }

    #[test]
    fn regex_flags_select_spec_kinds() {
        let e = entry("{inv.*:VD.*} 0.2 template-regexp net-regexp _em");
        assert!(e.spec().template().is_some_and(Spec::is_regex));
        assert!(e.spec().net().is_regex());
        assert!(e.em_enabled());
        assert!(!e.sh_enabled());
    }

    #[test]
    fn legacy_compound_flags() {
        let e = entry("{template:net} 0.5 template-regexp-net-regular_sch_em");
        assert!(e.spec().template().is_some_and(Spec::is_regex));
        assert!(!e.spec().net().is_regex());
        assert!(e.em_enabled());
        assert!(!e.sh_enabled());
    }

    #[test]
    fn braces_inside_patterns_are_balanced() {
        let e = entry("{top:d{2}_q} 0.1 net-regexp");
        assert_eq!(e.spec().net().text(), "d{2}_q");
    }

    #[test]
    fn colons_inside_groups_belong_to_the_pattern() {
        let e = entry("{(?i:inv):VDD} 0.5 template-regexp");
        assert_eq!(e.spec().template().map(Spec::text), Some("(?i:inv)"));
        assert_eq!(e.spec().net().text(), "VDD");

        let e = entry("{data[0:7]} 0.5");
        assert_eq!(e.spec().template(), None);
        assert_eq!(e.spec().net().text(), "data[0:7]");
    }

    #[test]
    fn inner_whitespace_is_trimmed() {
        assert_eq!(entry("  { tpl : VDD }   0.5  "), entry("{tpl:VDD} 0.5"));
    }

    #[test_case("", LineKind::Blank; "empty")]
    #[test_case("   \t", LineKind::Blank; "whitespace")]
    #[test_case("# {tpl:VDD} 0.5", LineKind::Comment; "comment")]
    #[test_case("   # indented", LineKind::Comment; "indented comment")]
    fn non_entry_lines(raw: &str, expected: LineKind) {
        assert_eq!(ConfigLine::parse(raw, 1).kind(), &expected);
    }

    #[test_case("template net 0.5", ParseReason::MissingOpenBrace, 1; "no braces")]
    #[test_case("{tpl:VDD 0.5", ParseReason::UnclosedBrace, 1; "unclosed")]
    #[test_case("{tpl:} 0.5", ParseReason::EmptyNet, 2; "empty net")]
    #[test_case("{tpl:VDD}", ParseReason::MissingActivityFactor, 10; "missing value")]
    #[test_case("{tpl:VDD}0.5", ParseReason::MissingSeparator, 10; "no separator")]
    #[test_case("{tpl:VDD} high", ParseReason::InvalidActivityFactor("high".to_string()), 11; "not a number")]
    fn parse_errors(raw: &str, reason: ParseReason, column: usize) {
        assert_eq!(
            error(raw),
            LineError::Parse(ParseError {
                line_number: 7,
                column,
                reason,
            })
        );
    }

    #[test]
    fn unknown_and_conflicting_flags_are_parse_errors() {
        let LineError::Parse(unknown) = error("{a:b} 0.5 turbo") else {
            panic!("expected parse error");
        };
        assert_eq!(unknown.column, 11);
        assert!(matches!(unknown.reason, ParseReason::Flag(FlagError::Unknown(_))));

        let LineError::Parse(conflict) = error("{a:b} 0.5 net-regexp net-regular") else {
            panic!("expected parse error");
        };
        assert!(matches!(conflict.reason, ParseReason::Flag(FlagError::Conflict(_))));
    }

    #[test_case("0.0", true)]
    #[test_case("1.0", true)]
    #[test_case("0", true)]
    #[test_case("1", true)]
    #[test_case("-0.0001", false)]
    #[test_case("1.0001", false)]
    #[test_case("NaN", false)]
    #[test_case("inf", false)]
    fn activity_factor_boundary(value: &str, valid: bool) {
        let line = ConfigLine::parse(&format!("{{tpl:VDD}} {value}"), 3);
        if valid {
            assert!(line.entry().is_some());
        } else {
            let Some(LineError::Validation(err)) = line.error() else {
                panic!("expected a validation error for {value}");
            };
            assert_eq!(err.line_number, 3);
            assert_eq!(err.column, 11);
            assert!(matches!(
                err.reason,
                ValidationReason::ActivityFactorOutOfRange(_)
            ));
        }
    }

    #[test_case("{tpl:VDD} 0.5 net-regular")]
    #[test_case("{:CLK} 1.0")]
    #[test_case("   {  x.* : y[0-9]+ }   0.25   template-regexp   net-regexp  _sh")]
    #[test_case("{a:b} 0.3 template-regular-net-regexp_sch_em_sh")]
    #[test_case("{CLK} 0")]
    #[test_case("# just a comment")]
    #[test_case("garbage line")]
    #[test_case("{a:b} 7")]
    #[test_case("")]
    fn serialize_is_left_inverse_of_parse(raw: &str) {
        let first = ConfigLine::parse(raw, 4);
        let second = ConfigLine::parse(&serialize(&first), 4);
        assert_eq!(first.kind(), second.kind());
    }

    #[test]
    fn serialization_is_canonical() {
        let line = ConfigLine::parse("  {tpl : VDD}   1   _sh net-regular ", 1);
        assert_eq!(serialize(&line), "{tpl:VDD} 1.0 net-regular _sh");
        assert_eq!(
            line.serialize(FlagStyle::Compound),
            "{tpl:VDD} 1.0 template-regular_net-regular_sch_sh"
        );
    }

    #[test]
    fn comments_and_invalid_lines_are_verbatim() {
        for raw in ["#   spaced   comment", "not an entry   "] {
            assert_eq!(serialize(&ConfigLine::parse(raw, 1)), raw);
        }
    }

    #[test]
    fn toggle_comment_round_trips() {
        let line = ConfigLine::parse("{tpl:VDD} 0.5", 2);
        let commented = line.toggle_comment();
        assert!(commented.is_comment());
        assert_eq!(commented.raw(), "# {tpl:VDD} 0.5");
        assert_eq!(commented.toggle_comment(), line);
    }

    #[test]
    fn entry_new_aligns_flags_with_specs() {
        let spec = MatchSpec::new(
            Some(Spec::literal("tpl").unwrap()),
            Spec::regex("VD.*").unwrap(),
        );
        let mut flags = FlagSet::new();
        flags.insert(Flag::TemplateRegex).unwrap();
        flags.insert(Flag::NetLiteral).unwrap();

        let e = Entry::new(spec, 0.5, flags).unwrap();
        assert!(!e.flags().template_is_regex());
        assert!(e.flags().net_is_regex());
        assert!(!e.flags().contains(Flag::NetLiteral));
    }

    #[test]
    fn entry_new_rejects_bad_values() {
        let spec = MatchSpec::any_template(Spec::literal("VDD").unwrap());
        assert!(matches!(
            Entry::new(spec.clone(), 1.5, FlagSet::new()),
            Err(ValidationReason::ActivityFactorOutOfRange(_))
        ));
        let bad_template = MatchSpec::new(Some(Spec::literal("a:b").unwrap()), spec.net().clone());
        assert!(matches!(
            Entry::new(bad_template, 0.5, FlagSet::new()),
            Err(ValidationReason::ColonInTemplate(_))
        ));
    }

    #[test]
    fn hints_describe_the_line() {
        assert_eq!(ConfigLine::parse("", 1).hint().as_deref(), Some("Empty line"));
        assert_eq!(ConfigLine::parse("# c", 1).hint().as_deref(), Some("Comment line"));
        assert_eq!(ConfigLine::parse("{a:b} 0.5", 1).hint(), None);
        assert_eq!(
            ConfigLine::parse("{a:b} 2", 5).hint().as_deref(),
            Some("column 7: activity factor 2 is outside [0, 1]")
        );
    }

    #[test]
    fn renumber_moves_errors_too() {
        let mut line = ConfigLine::parse("{a:b} 2", 5);
        line.renumber(9);
        assert_eq!(line.line_number(), 9);
        assert_eq!(line.error().map(LineError::line_number), Some(9));
    }
}
