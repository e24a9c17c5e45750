use std::cell::OnceCell;

use crate::domain::{ConfigLine, LineKind};

/// Coarse state of a row, for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Nothing on the line.
    Blank,
    /// A `#` comment.
    Comment,
    /// A well-formed entry.
    Entry,
    /// A line that failed to parse or validate.
    Invalid,
}

/// What the presentation layer shows for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDisplay {
    /// The line's text as typed.
    pub text: String,
    /// Coarse line state.
    pub status: RowStatus,
    /// Short description or error message.
    pub hint: Option<String>,
}

impl RowDisplay {
    fn render(line: &ConfigLine) -> Self {
        let status = match line.kind() {
            LineKind::Blank => RowStatus::Blank,
            LineKind::Comment => RowStatus::Comment,
            LineKind::Entry(_) => RowStatus::Entry,
            LineKind::Invalid(_) => RowStatus::Invalid,
        };
        Self {
            text: line.raw().to_string(),
            status,
            hint: line.hint(),
        }
    }
}

/// A line plus its lazily rendered display form.
///
/// The display never depends on the line number, so rows keep their cache
/// when edits elsewhere shift them.
#[derive(Debug)]
pub(super) struct Row {
    pub(super) line: ConfigLine,
    display: OnceCell<RowDisplay>,
}

impl Row {
    pub(super) const fn new(line: ConfigLine) -> Self {
        Self {
            line,
            display: OnceCell::new(),
        }
    }

    /// Returns the display form, rendering it on first use.
    ///
    /// `on_render` runs only when rendering actually happens.
    pub(super) fn display(&self, on_render: impl FnOnce()) -> &RowDisplay {
        self.display.get_or_init(|| {
            on_render();
            RowDisplay::render(&self.line)
        })
    }

    pub(super) fn into_line(self) -> ConfigLine {
        self.line
    }
}

/// One row of a [`Document::visible_slice`](super::Document::visible_slice).
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    /// 0-based position in the document.
    pub index: usize,
    /// The parsed line.
    pub line: &'a ConfigLine,
    /// Its display form.
    pub display: &'a RowDisplay,
}
