//! Linear undo/redo history over region-set snapshots.

use crate::region::Region;

/// Default cap on undo snapshots.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// A full copy of a region list.
pub type Snapshot = Vec<Region>;

/// Two stacks of snapshots. Structural edits push the pre-mutation state;
/// any new push invalidates the redo branch.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    max_depth: usize,
    gesture: Option<Snapshot>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// History that keeps at most `max_depth` undo entries (minimum 1).
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
            gesture: None,
        }
    }

    /// Record the state before a structural mutation and clear redo.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.undo.push(snapshot);
        if self.undo.len() > self.max_depth {
            let overflow = self.undo.len() - self.max_depth;
            self.undo.drain(..overflow);
        }
        self.reset_redo();
    }

    /// Step back. `current` is the live state, which moves onto redo.
    ///
    /// Returns `None` (and keeps `current` out of history) when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Mirror of [`EditHistory::undo`].
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    pub fn reset_redo(&mut self) {
        self.redo.clear();
    }

    /// Remember the state at the start of a drag without touching the stacks.
    pub fn begin_gesture(&mut self, snapshot: Snapshot) {
        self.gesture = Some(snapshot);
    }

    /// Close a drag. The remembered state is pushed only when the drag
    /// actually changed something.
    pub fn end_gesture(&mut self, changed: bool) -> bool {
        match self.gesture.take() {
            Some(snapshot) if changed => {
                self.push(snapshot);
                true
            }
            _ => false,
        }
    }

    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Forget an open drag without recording it.
    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Drop every snapshot, including an open gesture.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.gesture = None;
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}
