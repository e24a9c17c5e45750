//! Colouring for terminal output.

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout is a terminal that understands colour.
fn supports_color() -> bool {
    supports_color::on_cached(supports_color::Stream::Stdout).is_some()
}

/// Extension trait for colouring report text.
///
/// Text is returned unchanged when colour is unsupported, so output piped to
/// a file stays plain.
pub trait Colorize {
    /// Colour as success (green)
    fn success(&self) -> String;
    /// Colour as a problem (orange)
    fn warning(&self) -> String;
    /// Colour as a heading (blue)
    fn info(&self) -> String;
    /// De-emphasize
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}
