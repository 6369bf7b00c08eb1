use uuid::Uuid;

use crate::history::{SnapshotHistory, MAX_HISTORY};
use crate::snapshot::Snapshot;

/// Number of drawing tabs per annotation session. Fixed: tabs are never
/// added, removed, or reordered while the widget is open.
pub const TAB_CAPACITY: usize = 4;

/// Stable opaque identifier for one tab, assigned at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// One independent drawing surface: its current snapshot (None = blank) and
/// its own undo/redo stacks. Tabs own their document state outright; tool
/// and zoom settings live in the session-global `ToolState` instead.
pub struct Tab {
    id: TabId,
    name: String,
    pub image: Option<Snapshot>,
    pub history: SnapshotHistory,
}

impl Tab {
    fn new(position: usize, image: Option<Snapshot>) -> Self {
        Self {
            id: TabId::new(),
            name: (position + 1).to_string(),
            image,
            history: SnapshotHistory::new(MAX_HISTORY),
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    /// Display label: the tab's 1-based position, fixed at creation.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The fixed-size tab collection plus the active-tab cursor.
pub struct TabSet {
    tabs: Vec<Tab>,
    active: usize,
}

impl TabSet {
    /// Build exactly `TAB_CAPACITY` tabs from up to that many host-supplied
    /// seed snapshots; missing slots become blank tabs. An oversized seed
    /// list or out-of-range initial index is a caller-contract violation.
    pub fn from_seeds(seeds: Vec<Option<Snapshot>>, initial_active: usize) -> Self {
        assert!(
            seeds.len() <= TAB_CAPACITY,
            "seed image count {} exceeds tab capacity {}",
            seeds.len(),
            TAB_CAPACITY
        );
        assert!(
            initial_active < TAB_CAPACITY,
            "initial tab index {} out of range",
            initial_active
        );

        let mut seeds = seeds.into_iter();
        let tabs = (0..TAB_CAPACITY)
            .map(|position| Tab::new(position, seeds.next().flatten()))
            .collect();
        Self {
            tabs,
            active: initial_active,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) {
        assert!(index < self.tabs.len(), "tab index {} out of range", index);
        self.active = index;
    }

    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.active]
    }

    pub fn active_tab_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.active]
    }

    pub fn get(&self, index: usize) -> &Tab {
        &self.tabs[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    /// The ordered image slots handed back to the host on save.
    pub fn export_images(&self) -> Vec<Option<Snapshot>> {
        self.tabs.iter().map(|tab| tab.image.clone()).collect()
    }
}
