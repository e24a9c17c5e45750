//! Literal and regular-expression selectors for templates and nets.

use std::fmt;

use non_empty_string::NonEmptyString;

/// Which half of a `{template:net}` specifier a [`Spec`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecPart {
    /// The part before the colon.
    Template,
    /// The part after the colon.
    Net,
}

impl fmt::Display for SpecPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Net => f.write_str("net"),
        }
    }
}

/// A name selector: either exact text or a regular expression.
///
/// Regular expressions always match the whole name, never a substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Spec {
    /// Matches names equal to the text.
    Literal(NonEmptyString),
    /// Matches names fully matched by the pattern.
    Regex(NonEmptyString),
}

/// Error returned when a [`Spec`] is built from empty text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a template or net specifier cannot be empty")]
pub struct EmptySpecError;

impl Spec {
    /// Creates a literal spec.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySpecError`] if `text` is empty.
    pub fn literal(text: impl Into<String>) -> Result<Self, EmptySpecError> {
        NonEmptyString::new(text.into())
            .map(Self::Literal)
            .map_err(|_| EmptySpecError)
    }

    /// Creates a regular-expression spec.
    ///
    /// The pattern is not compiled here; syntax errors surface on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySpecError`] if `pattern` is empty.
    pub fn regex(pattern: impl Into<String>) -> Result<Self, EmptySpecError> {
        NonEmptyString::new(pattern.into())
            .map(Self::Regex)
            .map_err(|_| EmptySpecError)
    }

    /// Creates a spec of the requested kind.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySpecError`] if `text` is empty.
    pub fn new(text: impl Into<String>, is_regex: bool) -> Result<Self, EmptySpecError> {
        if is_regex {
            Self::regex(text)
        } else {
            Self::literal(text)
        }
    }

    /// The literal text or the pattern source.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Regex(text) => text.as_str(),
        }
    }

    /// Whether this spec is a regular expression.
    #[must_use]
    pub const fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }

    /// A canonical, collision-free key for caching.
    ///
    /// Literal and regex specs with the same text produce different keys.
    #[must_use]
    pub(crate) fn canonical(&self) -> String {
        match self {
            Self::Literal(text) => format!("L:{text}"),
            Self::Regex(text) => format!("R:{text}"),
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text}"),
            Self::Regex(pattern) => write!(f, "/{pattern}/"),
        }
    }
}

/// A `{template:net}` selector.
///
/// The template part is optional; when absent every template is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchSpec {
    template: Option<Spec>,
    net: Spec,
}

impl MatchSpec {
    /// Creates a selector from its parts.
    #[must_use]
    pub const fn new(template: Option<Spec>, net: Spec) -> Self {
        Self { template, net }
    }

    /// Selector for `net` in any template.
    #[must_use]
    pub const fn any_template(net: Spec) -> Self {
        Self::new(None, net)
    }

    /// The template selector, if restricted.
    #[must_use]
    pub const fn template(&self) -> Option<&Spec> {
        self.template.as_ref()
    }

    /// The net selector.
    #[must_use]
    pub const fn net(&self) -> &Spec {
        &self.net
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let template = self.template.as_ref().map_or("", Spec::text);
        write!(f, "{{{template}:{}}}", self.net.text())
    }
}
