//! The line-oriented editing core.
//!
//! A [`Document`] owns the parsed lines of one AF file together with an
//! undo/redo history of [`Command`]s. Presentation layers read it through
//! [`Document::visible_slice`], which renders only the rows they ask for, and
//! learn about changes by [subscribing](Document::subscribe).

use std::{cell::Cell, fmt};

use nonempty::NonEmpty;

mod command;
pub use command::Command;

mod history;
use history::History;

mod view;
pub use view::{RowDisplay, RowStatus, VisibleRow};
use view::Row;

use crate::domain::{Config, ConfigLine, FlagStyle};

/// An edit addressed a line that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("line index {index} is out of range for a document of {len} lines")]
pub struct IndexError {
    /// The offending index.
    pub index: usize,
    /// Number of lines at the time of the edit.
    pub len: usize,
}

/// Outcome of [`Document::undo`] and [`Document::redo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// A step was undone or redone.
    Applied,
    /// There was nothing to undo or redo.
    Empty,
}

/// A change observers are told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A line was inserted at `index`.
    Inserted {
        /// Position of the new line.
        index: usize,
    },
    /// The line at `index` was removed.
    Removed {
        /// Former position of the line.
        index: usize,
    },
    /// The line at `index` was replaced.
    Replaced {
        /// Position of the line.
        index: usize,
    },
    /// The document became dirty (`true`) or clean (`false`).
    DirtyChanged(bool),
    /// The document was serialized for saving.
    Saved,
}

type Subscriber = Box<dyn FnMut(&DocumentEvent)>;

/// An AF file being edited.
pub struct Document {
    rows: Vec<Row>,
    history: History,
    saved: history::Revision,
    flag_style: FlagStyle,
    subscribers: Vec<Subscriber>,
    rendered: Cell<usize>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.rows.len())
            .field("history", &self.history)
            .field("saved", &self.saved)
            .field("flag_style", &self.flag_style)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty document honouring `config`.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        let history = History::new(config.history_limit());
        Self {
            rows: Vec::new(),
            saved: history.current(),
            history,
            flag_style: config.flag_style,
            subscribers: Vec::new(),
            rendered: Cell::new(0),
        }
    }

    /// Parses `text` with the default configuration.
    ///
    /// See [`Document::load_with_config`].
    #[must_use]
    pub fn load(text: &str) -> Self {
        Self::load_with_config(text, &Config::default())
    }

    /// Parses `text` into a clean document.
    ///
    /// Lines may end in `\n` or `\r\n`. Lines that fail to parse are kept as
    /// [`LineKind::Invalid`](crate::domain::LineKind::Invalid) records.
    #[must_use]
    pub fn load_with_config(text: &str, config: &Config) -> Self {
        let mut document = Self::with_config(config);
        document.rows = text
            .lines()
            .enumerate()
            .map(|(i, raw)| Row::new(ConfigLine::parse(raw, i + 1)))
            .collect();

        let invalid = document.lines().filter(|line| line.error().is_some()).count();
        tracing::debug!(
            "Loaded document with {} lines ({invalid} invalid)",
            document.len()
        );
        document
    }

    /// Serializes the document and marks it clean.
    ///
    /// Entries are written canonically, every other line verbatim. The
    /// result ends with a newline unless the document is empty. The undo and
    /// redo history is kept.
    pub fn save(&mut self) -> String {
        let text = self.text();
        let was_dirty = self.is_dirty();
        self.saved = self.history.current();
        self.emit(DocumentEvent::Saved);
        self.notify_dirty(was_dirty);
        text
    }

    /// The text [`Document::save`] would produce, without marking the
    /// document clean.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            text.push_str(&line.serialize(self.flag_style));
            text.push('\n');
        }
        text
    }

    /// Applies an edit as one undo step.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the command addresses a line that does not
    /// exist. The document is left unchanged, including when a later command
    /// of a batch fails.
    pub fn apply(&mut self, command: Command) -> Result<(), IndexError> {
        let was_dirty = self.is_dirty();
        let mut events = Vec::new();
        let inverse = self.execute(command, &mut events)?;
        self.history.record(inverse);
        self.flush(events);
        self.notify_dirty(was_dirty);
        Ok(())
    }

    /// Reverts the most recent edit.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] only if the history no longer fits the lines,
    /// which edits made through this type cannot cause.
    pub fn undo(&mut self) -> Result<HistoryStep, IndexError> {
        let was_dirty = self.is_dirty();
        let Some((revision, inverse)) = self.history.pop_undo() else {
            return Ok(HistoryStep::Empty);
        };
        let mut events = Vec::new();
        let redo = self.execute(inverse, &mut events)?;
        self.history.push_redo(revision, redo);
        self.flush(events);
        self.notify_dirty(was_dirty);
        Ok(HistoryStep::Applied)
    }

    /// Re-applies the most recently undone edit.
    ///
    /// # Errors
    ///
    /// See [`Document::undo`].
    pub fn redo(&mut self) -> Result<HistoryStep, IndexError> {
        let was_dirty = self.is_dirty();
        let Some((revision, command)) = self.history.pop_redo() else {
            return Ok(HistoryStep::Empty);
        };
        let mut events = Vec::new();
        let inverse = self.execute(command, &mut events)?;
        self.history.push_undo(revision, inverse);
        self.flush(events);
        self.notify_dirty(was_dirty);
        Ok(HistoryStep::Applied)
    }

    /// Whether there is an edit to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether there is an undone edit to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether the lines differ from the last saved (or loaded) state.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.history.current() != self.saved
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the document has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The line at `index`, if any.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&ConfigLine> {
        self.rows.get(index).map(|row| &row.line)
    }

    /// All lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &ConfigLine> {
        self.rows.iter().map(|row| &row.line)
    }

    /// The display forms of up to `count` lines starting at `start`.
    ///
    /// The window is clamped to the document. Only rows inside it are
    /// rendered, and each row is rendered at most once until it is edited.
    #[must_use]
    pub fn visible_slice(&self, start: usize, count: usize) -> Vec<VisibleRow<'_>> {
        let start = start.min(self.rows.len());
        let end = start.saturating_add(count).min(self.rows.len());
        self.rows[start..end]
            .iter()
            .enumerate()
            .map(|(offset, row)| VisibleRow {
                index: start + offset,
                line: &row.line,
                display: row.display(|| self.rendered.set(self.rendered.get() + 1)),
            })
            .collect()
    }

    /// How many row displays have been rendered so far.
    #[must_use]
    pub fn rendered_rows(&self) -> usize {
        self.rendered.get()
    }

    /// Registers a callback run after every change.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&DocumentEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Parses `text` and inserts it at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if `index` is greater than the number of lines.
    pub fn insert_text(&mut self, index: usize, text: &str) -> Result<(), IndexError> {
        self.apply(Command::insert(index, text))
    }

    /// Parses `text` and puts it in place of the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if there is no line at `index`.
    pub fn replace_text(&mut self, index: usize, text: &str) -> Result<(), IndexError> {
        self.apply(Command::replace(index, text))
    }

    /// Comments out the line at `index`, or uncomments it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if there is no line at `index`.
    pub fn toggle_comment(&mut self, index: usize) -> Result<(), IndexError> {
        let line = self.existing(index)?.toggle_comment();
        self.apply(Command::Replace { index, line })
    }

    /// Inserts a copy of the line at `index` right below it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if there is no line at `index`.
    pub fn duplicate(&mut self, index: usize) -> Result<(), IndexError> {
        let line = self.existing(index)?.clone();
        self.apply(Command::Insert {
            index: index + 1,
            line,
        })
    }

    /// Moves the line at `from` so that it ends up at `to`.
    ///
    /// Moving a line onto itself records nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if either position is not an existing line.
    pub fn move_line(&mut self, from: usize, to: usize) -> Result<(), IndexError> {
        let line = self.existing(from)?.clone();
        self.existing(to)?;
        if from == to {
            return Ok(());
        }
        let mut batch = NonEmpty::new(Command::delete(from));
        batch.push(Command::Insert { index: to, line });
        self.apply(Command::Batch(Box::new(batch)))
    }

    fn existing(&self, index: usize) -> Result<&ConfigLine, IndexError> {
        self.line(index).ok_or(IndexError {
            index,
            len: self.len(),
        })
    }

    /// Performs `command` and returns its inverse.
    ///
    /// Events are collected into `events` and only reach subscribers once
    /// the whole command has succeeded.
    fn execute(
        &mut self,
        command: Command,
        events: &mut Vec<DocumentEvent>,
    ) -> Result<Command, IndexError> {
        let len = self.rows.len();
        match command {
            Command::Insert { index, line } => {
                if index > len {
                    return Err(IndexError { index, len });
                }
                self.rows.insert(index, Row::new(line));
                self.renumber_from(index);
                events.push(DocumentEvent::Inserted { index });
                Ok(Command::Delete { index })
            }
            Command::Delete { index } => {
                if index >= len {
                    return Err(IndexError { index, len });
                }
                let line = self.rows.remove(index).into_line();
                self.renumber_from(index);
                events.push(DocumentEvent::Removed { index });
                Ok(Command::Insert { index, line })
            }
            Command::Replace { index, mut line } => {
                let Some(row) = self.rows.get_mut(index) else {
                    return Err(IndexError { index, len });
                };
                line.renumber(index + 1);
                let old = std::mem::replace(row, Row::new(line)).into_line();
                events.push(DocumentEvent::Replaced { index });
                Ok(Command::Replace { index, line: old })
            }
            Command::Batch(commands) => self.execute_batch(*commands, events),
        }
    }

    fn execute_batch(
        &mut self,
        commands: NonEmpty<Command>,
        events: &mut Vec<DocumentEvent>,
    ) -> Result<Command, IndexError> {
        let mark = events.len();
        let NonEmpty { head, tail } = commands;
        let first = self.execute(head, events)?;
        let mut rest = Vec::with_capacity(tail.len());

        for command in tail {
            match self.execute(command, events) {
                Ok(inverse) => rest.push(inverse),
                Err(e) => {
                    tracing::debug!("Batch edit failed ({e}), rolling back");
                    events.truncate(mark);
                    let mut discarded = Vec::new();
                    for inverse in rest.into_iter().rev().chain(std::iter::once(first)) {
                        if let Err(e) = self.execute(inverse, &mut discarded) {
                            tracing::error!("Failed to roll back batch edit: {e}");
                        }
                    }
                    return Err(e);
                }
            }
        }

        // Undoing a batch runs the inverses last-to-first.
        rest.reverse();
        rest.push(first);
        let head = rest.remove(0);
        Ok(Command::Batch(Box::new(NonEmpty { head, tail: rest })))
    }

    fn renumber_from(&mut self, index: usize) {
        for (i, row) in self.rows.iter_mut().enumerate().skip(index) {
            row.line.renumber(i + 1);
        }
    }

    fn flush(&mut self, events: Vec<DocumentEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn emit(&mut self, event: DocumentEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    fn notify_dirty(&mut self, was_dirty: bool) {
        let dirty = self.is_dirty();
        if dirty != was_dirty {
            self.emit(DocumentEvent::DirtyChanged(dirty));
        }
    }
}
