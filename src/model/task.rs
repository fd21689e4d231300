use std::cmp::Ordering;

use chrono::{Days, Months, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task relative to the external sync source.
///
/// The `WhenSync` variants mark decisions taken while a sync pass was
/// running; they collapse back to their plain counterparts when the pass
/// finishes (see [`TaskStatus::clear_sync_info`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created locally, not yet reported to the sync source.
    NewlyAdded,
    /// Known to the sync source; nothing to report.
    Unchanged,
    /// Trashed locally; the sync source still has to learn about it.
    Deleted,
    /// Created while a sync pass was running.
    AddedWhenSync,
    /// Trashed while a sync pass was running.
    DeletedWhenSync,
}

impl TaskStatus {
    /// Status for a task that has just been created.
    pub fn created(sync_running: bool) -> TaskStatus {
        if sync_running {
            TaskStatus::AddedWhenSync
        } else {
            TaskStatus::NewlyAdded
        }
    }

    /// Transition for a task being moved into the trash.
    ///
    /// A task the sync source never saw (`NewlyAdded`) reverts straight to
    /// `Unchanged`: there is no external trace to clean up, so no deletion
    /// record is kept.
    pub fn trashed(self, sync_running: bool) -> TaskStatus {
        match self {
            TaskStatus::Unchanged => {
                if sync_running {
                    TaskStatus::DeletedWhenSync
                } else {
                    TaskStatus::Deleted
                }
            }
            TaskStatus::NewlyAdded | TaskStatus::AddedWhenSync => TaskStatus::Unchanged,
            already_deleted => already_deleted,
        }
    }

    /// Transition for a task being restored out of the trash.
    ///
    /// Exact inverse of [`TaskStatus::trashed`]: an `Unchanged` trash entry
    /// was a `NewlyAdded` task when it was removed, so restoring it makes it
    /// `NewlyAdded` (or `AddedWhenSync`) again.
    pub fn restored(self, sync_running: bool) -> TaskStatus {
        match self {
            TaskStatus::Deleted | TaskStatus::DeletedWhenSync => TaskStatus::Unchanged,
            TaskStatus::Unchanged => {
                if sync_running {
                    TaskStatus::AddedWhenSync
                } else {
                    TaskStatus::NewlyAdded
                }
            }
            already_live => already_live,
        }
    }

    /// Collapse the provisional `WhenSync` variants once a pass has finished.
    pub fn clear_sync_info(self) -> TaskStatus {
        match self {
            TaskStatus::AddedWhenSync => TaskStatus::NewlyAdded,
            TaskStatus::DeletedWhenSync => TaskStatus::Deleted,
            other => other,
        }
    }
}

/// How often a task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    /// Shift a timestamp forward by one period.
    pub fn advance(self, t: NaiveDateTime) -> NaiveDateTime {
        match self {
            Recurrence::None => t,
            Recurrence::Daily => t.checked_add_days(Days::new(1)).unwrap_or(t),
            Recurrence::Weekly => t.checked_add_days(Days::new(7)).unwrap_or(t),
            Recurrence::Monthly => t.checked_add_months(Months::new(1)).unwrap_or(t),
            Recurrence::Yearly => t.checked_add_months(Months::new(12)).unwrap_or(t),
        }
    }

    pub fn is_none(self) -> bool {
        self == Recurrence::None
    }
}

/// A category label plus recurrence descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Free-form label, empty if untagged.
    pub label: String,
    pub recurrence: Recurrence,
}

/// A single task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Display text.
    pub text: String,
    pub tag: Tag,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub important: bool,
    /// Which occurrence of a recurring task this is (1-based; 0 if not recurring).
    pub current_occurrence: u32,
    /// Total occurrences of a recurring task (0 if not recurring).
    pub num_occurrences: u32,
    /// Identifier assigned by the sync source; empty if never synced.
    pub sync_id: String,
    pub modified_at: NaiveDateTime,
    pub status: TaskStatus,

    // --- Process-local state ---
    /// Identity assigned by the store. Stable across sorts and collection
    /// moves; never persisted.
    #[serde(skip)]
    pub uid: u64,
    /// Last row this task was displayed at. Cache only — resolution always
    /// goes through the store.
    #[serde(skip)]
    pub row_cache: usize,
}

impl Task {
    /// Create a task with the given text and no dates, unsynced.
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            text: text.into(),
            tag: Tag::default(),
            start: None,
            end: None,
            important: false,
            current_occurrence: 0,
            num_occurrences: 0,
            sync_id: String::new(),
            modified_at: now(),
            status: TaskStatus::NewlyAdded,
            uid: 0,
            row_cache: 0,
        }
    }

    /// Stamp the modification time.
    pub fn touch(&mut self) {
        self.modified_at = now();
    }

    /// True if this task repeats and has occurrences left after the current one.
    pub fn has_remaining_occurrences(&self) -> bool {
        !self.tag.recurrence.is_none() && self.current_occurrence < self.num_occurrences
    }
}

/// Current local time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    let t = chrono::Local::now().naive_local();
    t.with_nanosecond(0).unwrap_or(t)
}

/// The total order every canonical collection is kept in: end timestamp,
/// then start timestamp, then text. Tasks without a timestamp sort after
/// tasks with one.
pub fn chronological(a: &Task, b: &Task) -> Ordering {
    cmp_date(a.end, b.end)
        .then_with(|| cmp_date(a.start, b.start))
        .then_with(|| a.text.cmp(&b.text))
}

fn cmp_date(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.tag == other.tag
            && self.start == other.start
            && self.end == other.end
            && self.important == other.important
            && self.current_occurrence == other.current_occurrence
            && self.num_occurrences == other.num_occurrences
            && self.sync_id == other.sync_id
            && self.modified_at == other.modified_at
            && self.status == other.status
    }
}

impl Eq for Task {}
