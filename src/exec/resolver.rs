use crate::model::{ListKind, TaskStore};

/// Whether displayed rows map straight into a canonical collection or
/// through the active search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Shown,
    Searched,
}

/// Translates the row the user sees into a slot in a canonical collection.
///
/// In `Searched` mode the view stores uids, and the uid's position is looked
/// up at call time — the canonical collection may have been re-sorted since
/// the search was built, so a cached position would be stale.
#[derive(Debug, Default)]
pub struct IndexResolver {
    mode: ViewMode,
}

impl IndexResolver {
    pub fn new() -> Self {
        IndexResolver::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Number of rows currently visible for a collection.
    pub fn visible_len(&self, store: &TaskStore, tab: ListKind) -> usize {
        match self.mode {
            ViewMode::Shown => store.len(tab),
            ViewMode::Searched => store.search_view(tab).len(),
        }
    }

    /// Resolve a 0-based displayed row to a slot in the canonical collection.
    pub fn resolve(&self, store: &TaskStore, tab: ListKind, row: usize) -> Option<usize> {
        match self.mode {
            ViewMode::Shown => {
                if row < store.len(tab) {
                    Some(row)
                } else {
                    None
                }
            }
            ViewMode::Searched => {
                let uid = *store.search_view(tab).get(row)?;
                store.position_of(tab, uid)
            }
        }
    }
}
