use serde::{Deserialize, Serialize};

use crate::model::task::{Task, chronological};

/// The three canonical collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Pending,
    Completed,
    Trash,
}

impl ListKind {
    pub fn name(self) -> &'static str {
        match self {
            ListKind::Pending => "pending",
            ListKind::Completed => "completed",
            ListKind::Trash => "trash",
        }
    }

    pub fn all() -> [ListKind; 3] {
        [ListKind::Pending, ListKind::Completed, ListKind::Trash]
    }
}

/// Owner of the three canonical task collections plus the transient search
/// views over them.
///
/// Collections are always kept sorted by [`chronological`]; a task's position
/// is meaningful only between mutations. Search views hold task uids, not
/// positions, so they survive re-sorts.
#[derive(Debug, Default)]
pub struct TaskStore {
    pending: Vec<Task>,
    completed: Vec<Task>,
    trash: Vec<Task>,
    view_pending: Vec<u64>,
    view_completed: Vec<u64>,
    view_trash: Vec<u64>,
    next_uid: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore {
            next_uid: 1,
            ..TaskStore::default()
        }
    }

    /// Build a store from loaded collections, assigning fresh uids and
    /// sorting each collection.
    pub fn from_lists(pending: Vec<Task>, completed: Vec<Task>, trash: Vec<Task>) -> Self {
        let mut store = TaskStore::new();
        for (kind, tasks) in [
            (ListKind::Pending, pending),
            (ListKind::Completed, completed),
            (ListKind::Trash, trash),
        ] {
            for mut task in tasks {
                task.uid = 0;
                store.insert(kind, task);
            }
        }
        store
    }

    // -----------------------------------------------------------------------
    // Collection access
    // -----------------------------------------------------------------------

    pub fn list(&self, kind: ListKind) -> &[Task] {
        match kind {
            ListKind::Pending => &self.pending,
            ListKind::Completed => &self.completed,
            ListKind::Trash => &self.trash,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<Task> {
        match kind {
            ListKind::Pending => &mut self.pending,
            ListKind::Completed => &mut self.completed,
            ListKind::Trash => &mut self.trash,
        }
    }

    pub fn len(&self, kind: ListKind) -> usize {
        self.list(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty() && self.trash.is_empty()
    }

    pub fn task(&self, kind: ListKind, slot: usize) -> Option<&Task> {
        self.list(kind).get(slot)
    }

    pub fn task_mut(&mut self, kind: ListKind, slot: usize) -> Option<&mut Task> {
        self.list_mut(kind).get_mut(slot)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Insert a task, assigning a uid if it does not carry one, and re-sort.
    /// Returns the task's uid.
    pub fn insert(&mut self, kind: ListKind, mut task: Task) -> u64 {
        if task.uid == 0 {
            task.uid = self.next_uid;
            self.next_uid += 1;
        }
        let uid = task.uid;
        self.list_mut(kind).push(task);
        self.sort(kind);
        uid
    }

    /// Remove the task at `slot`. The caller re-sorts if it inserts elsewhere;
    /// removal itself preserves order.
    pub fn remove_at(&mut self, kind: ListKind, slot: usize) -> Option<Task> {
        let list = self.list_mut(kind);
        if slot < list.len() {
            Some(list.remove(slot))
        } else {
            None
        }
    }

    /// Remove the task with the given uid, wherever it sits in `kind`.
    pub fn remove_uid(&mut self, kind: ListKind, uid: u64) -> Option<Task> {
        let slot = self.position_of(kind, uid)?;
        self.remove_at(kind, slot)
    }

    /// Replace a whole collection (snapshot restore). Uids on the incoming
    /// tasks are kept as-is.
    pub fn replace(&mut self, kind: ListKind, tasks: Vec<Task>) {
        *self.list_mut(kind) = tasks;
        self.sort(kind);
    }

    /// Re-sort a collection and refresh each task's row cache.
    pub fn sort(&mut self, kind: ListKind) {
        let list = self.list_mut(kind);
        list.sort_by(chronological);
        for (row, task) in list.iter_mut().enumerate() {
            task.row_cache = row;
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Current position of a uid within a collection.
    pub fn position_of(&self, kind: ListKind, uid: u64) -> Option<usize> {
        self.list(kind).iter().position(|t| t.uid == uid)
    }

    /// Find a uid across all three collections.
    pub fn find_uid(&self, uid: u64) -> Option<(ListKind, usize)> {
        ListKind::all()
            .into_iter()
            .find_map(|kind| self.position_of(kind, uid).map(|slot| (kind, slot)))
    }

    pub fn task_by_uid_mut(&mut self, kind: ListKind, uid: u64) -> Option<&mut Task> {
        let slot = self.position_of(kind, uid)?;
        self.task_mut(kind, slot)
    }

    /// Iterate every task in every collection, mutably.
    pub fn all_tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.pending
            .iter_mut()
            .chain(self.completed.iter_mut())
            .chain(self.trash.iter_mut())
    }

    // -----------------------------------------------------------------------
    // Search views
    // -----------------------------------------------------------------------

    pub fn search_view(&self, kind: ListKind) -> &[u64] {
        match kind {
            ListKind::Pending => &self.view_pending,
            ListKind::Completed => &self.view_completed,
            ListKind::Trash => &self.view_trash,
        }
    }

    /// Install fresh search views, one uid list per collection.
    pub fn set_search_views(&mut self, pending: Vec<u64>, completed: Vec<u64>, trash: Vec<u64>) {
        self.view_pending = pending;
        self.view_completed = completed;
        self.view_trash = trash;
    }

    pub fn clear_search_views(&mut self) {
        self.view_pending.clear();
        self.view_completed.clear();
        self.view_trash.clear();
    }
}
