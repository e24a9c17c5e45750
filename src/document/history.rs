use std::collections::VecDeque;

use super::Command;

/// Identifies the document state reached by one recorded edit.
pub type Revision = u64;

/// Undo and redo stacks of inverse commands.
///
/// Each entry is tagged with the revision its edit produced, so the document
/// can tell whether it is back at its saved state.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<(Revision, Command)>,
    redo: Vec<(Revision, Command)>,
    limit: Option<usize>,
    next: Revision,
    /// Revision of the state below the oldest undo entry.
    base: Revision,
}

impl History {
    pub const fn new(limit: Option<usize>) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
            next: 1,
            base: 0,
        }
    }

    /// The revision the document is currently at.
    pub fn current(&self) -> Revision {
        self.undo.back().map_or(self.base, |(revision, _)| *revision)
    }

    /// Records the inverse of a fresh edit. Discards the redo stack.
    pub fn record(&mut self, inverse: Command) {
        let revision = self.next;
        self.next += 1;
        self.redo.clear();
        self.undo.push_back((revision, inverse));

        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                if let Some((dropped, _)) = self.undo.pop_front() {
                    tracing::trace!("Undo history full, dropping revision {dropped}");
                    self.base = dropped;
                }
            }
        }
    }

    pub fn pop_undo(&mut self) -> Option<(Revision, Command)> {
        self.undo.pop_back()
    }

    pub fn push_redo(&mut self, revision: Revision, command: Command) {
        self.redo.push((revision, command));
    }

    pub fn pop_redo(&mut self) -> Option<(Revision, Command)> {
        self.redo.pop()
    }

    /// Puts an entry back on the undo stack without touching redo.
    pub fn push_undo(&mut self, revision: Revision, command: Command) {
        self.undo.push_back((revision, command));
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
