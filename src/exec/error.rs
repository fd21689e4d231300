/// Expected, recoverable failures of the command engine. Every variant is
/// surfaced to the caller verbatim; none aborts the process. A command that
/// fails has performed no mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("duplicate row number: {0}")]
    DuplicateIndex(usize),
    #[error("row {0} is out of bounds")]
    IndexOutOfBounds(usize),
    #[error("{op} is not valid on the {tab} list")]
    WrongTab { op: &'static str, tab: &'static str },
    #[error("nothing to edit: no fields given")]
    NoEditInfo,
    #[error("end date is before start date")]
    InvalidDateRange,
    #[error("a recurring task needs an end date and an occurrence count")]
    InvalidRecurrenceWindow,
    #[error("nothing to undo")]
    UndoUnavailable,
    #[error("nothing to redo")]
    RedoUnavailable,
    #[error("a sync pass is in progress; try again when it finishes")]
    SyncInProgress,
    #[error("sync is not configured; set sync.feed first")]
    SyncNotConfigured,
    #[error("settings error: {0}")]
    Settings(String),
}
