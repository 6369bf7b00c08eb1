use std::collections::VecDeque;

use crate::snapshot::{Snapshot, SnapshotError};
use crate::surface::Surface;

/// Maximum number of snapshots retained per tab. Older entries slide out;
/// deep undo beyond this window is unrecoverable by design.
pub const MAX_HISTORY: usize = 40;

/// Per-tab undo/redo stacks over whole-surface snapshots.
///
/// Invariants: once seeded, the history holds at least one entry (the
/// irreducible base state) and its last entry always matches what the tab
/// last rendered. The redo stack is populated only by `undo`, drained by
/// `redo`, and cleared by any new `push`.
#[derive(Debug)]
pub struct SnapshotHistory {
    entries: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    max_len: usize,
}

impl SnapshotHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            redo: VecDeque::new(),
            max_len,
        }
    }

    pub fn is_seeded(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Install the base entry after a tab's first render. Valid only while
    /// the history is empty.
    pub fn seed(&mut self, snapshot: Snapshot) {
        debug_assert!(self.entries.is_empty(), "seed called on a live history");
        self.entries.push_back(snapshot);
    }

    /// Commit a new snapshot: append, evict the oldest past the bound, and
    /// invalidate any redo entries.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.redo.clear();
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// The snapshot matching the tab's current rendered content.
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Step back one snapshot, repainting `surface` from the new last entry.
    ///
    /// The restore runs first; the stacks move only once the repaint has
    /// succeeded, so a failed decode leaves history, redo, and surface all
    /// unchanged. Returns `Ok(false)` when already at the base state.
    pub fn undo(&mut self, surface: &mut Surface) -> Result<bool, SnapshotError> {
        if !self.can_undo() {
            return Ok(false);
        }
        let target = self.entries[self.entries.len() - 2].clone();
        surface.restore(&target)?;
        if let Some(undone) = self.entries.pop_back() {
            self.redo.push_front(undone);
        }
        Ok(true)
    }

    /// Re-apply the most recently undone snapshot. Same restore-then-commit
    /// ordering as `undo`. Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, surface: &mut Surface) -> Result<bool, SnapshotError> {
        let Some(target) = self.redo.front().cloned() else {
            return Ok(false);
        };
        surface.restore(&target)?;
        self.redo.pop_front();
        self.entries.push_back(target);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Paint a recognizable mark and return the resulting snapshot.
    fn mark(surface: &mut Surface, step: u8) -> Snapshot {
        let x = 4.0 + step as f32 * 6.0;
        surface.stroke_segment((x, 10.0), (x, 50.0), Rgba([step, 0, 0, 255]), 4.0);
        surface.snapshot().unwrap()
    }

    fn seeded(surface: &mut Surface, max_len: usize) -> SnapshotHistory {
        let mut history = SnapshotHistory::new(max_len);
        history.seed(surface.snapshot().unwrap());
        history
    }

    #[test]
    fn bound_keeps_most_recent_in_order() {
        let mut surface = Surface::new(64);
        let mut history = seeded(&mut surface, 5);

        let mut committed = Vec::new();
        for step in 1..=8 {
            let snap = mark(&mut surface, step);
            history.push(snap.clone());
            committed.push(snap);
        }

        assert_eq!(history.len(), 5);
        let retained: Vec<_> = history.entries().cloned().collect();
        assert_eq!(retained, committed[3..].to_vec());
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let mut surface = Surface::new(64);
        let mut history = seeded(&mut surface, MAX_HISTORY);
        let s1 = mark(&mut surface, 1);
        history.push(s1.clone());
        let s2 = mark(&mut surface, 2);
        history.push(s2.clone());

        assert!(history.undo(&mut surface).unwrap());
        assert_eq!(history.current(), Some(&s1));
        assert_eq!(surface.snapshot().unwrap(), s1);
        assert_eq!(history.redo_len(), 1);

        assert!(history.redo(&mut surface).unwrap());
        assert_eq!(history.current(), Some(&s2));
        assert_eq!(surface.snapshot().unwrap(), s2);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn push_after_undo_invalidates_redo() {
        let mut surface = Surface::new(64);
        let mut history = seeded(&mut surface, MAX_HISTORY);
        history.push(mark(&mut surface, 1));
        assert!(history.undo(&mut surface).unwrap());
        assert!(history.can_redo());

        history.push(mark(&mut surface, 2));
        assert!(!history.can_redo());
        assert!(!history.redo(&mut surface).unwrap());
    }

    #[test]
    fn undo_at_base_state_is_a_noop() {
        let mut surface = Surface::new(64);
        let mut history = seeded(&mut surface, MAX_HISTORY);
        let base = history.current().cloned().unwrap();

        assert!(!history.undo(&mut surface).unwrap());
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&base));
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn failed_restore_leaves_stacks_untouched() {
        let mut surface = Surface::new(64);
        let mut history = SnapshotHistory::new(MAX_HISTORY);
        history.seed(Snapshot::from_encoded(vec![0, 1, 2]));
        let good = mark(&mut surface, 1);
        history.push(good.clone());

        // Undoing would repaint from the corrupt base entry.
        assert!(history.undo(&mut surface).is_err());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some(&good));
        assert_eq!(history.redo_len(), 0);
    }
}
