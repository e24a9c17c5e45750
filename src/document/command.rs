use nonempty::NonEmpty;

use crate::domain::ConfigLine;

/// An edit to a [`Document`](super::Document).
///
/// Every command has an inverse, which is what the undo history stores.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Inserts `line` so that it ends up at `index`. Valid for `0..=len`.
    Insert {
        /// Position of the new line.
        index: usize,
        /// The line to insert.
        line: ConfigLine,
    },
    /// Removes the line at `index`.
    Delete {
        /// Position of the line to remove.
        index: usize,
    },
    /// Swaps the line at `index` for `line`.
    Replace {
        /// Position of the line to replace.
        index: usize,
        /// The new line.
        line: ConfigLine,
    },
    /// Several commands applied in order as a single undo step.
    ///
    /// If any of them fails, the ones already applied are rolled back.
    Batch(Box<NonEmpty<Self>>),
}

impl Command {
    /// Parses `text` and inserts it at `index`.
    #[must_use]
    pub fn insert(index: usize, text: &str) -> Self {
        Self::Insert {
            index,
            line: ConfigLine::parse(text, index + 1),
        }
    }

    /// Removes the line at `index`.
    #[must_use]
    pub const fn delete(index: usize) -> Self {
        Self::Delete { index }
    }

    /// Parses `text` and puts it in place of the line at `index`.
    #[must_use]
    pub fn replace(index: usize, text: &str) -> Self {
        Self::Replace {
            index,
            line: ConfigLine::parse(text, index + 1),
        }
    }
}
