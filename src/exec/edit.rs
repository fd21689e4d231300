use chrono::NaiveDateTime;

use crate::exec::command::{ExecContext, Executable, Feedback, Reversible};
use crate::exec::error::CommandError;
use crate::model::{ListKind, Recurrence, Task};

/// Fields to change on the target task. `None` means "leave alone" — only
/// fields the user actually gave are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditPatch {
    pub text: Option<String>,
    pub tag: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub occurrences: Option<u32>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub important: Option<bool>,
}

impl EditPatch {
    pub fn is_empty(&self) -> bool {
        *self == EditPatch::default()
    }
}

/// Before/after snapshots of the single edited task. Value copies, owned by
/// the command — never references into the live store.
#[derive(Debug)]
struct EditMemento {
    uid: u64,
    tab: ListKind,
    before: Task,
    after: Task,
}

/// Edits one task in place. The row is resolved once, at execute time; undo
/// and redo overwrite the live task with the captured snapshots.
#[derive(Debug)]
pub struct EditCommand {
    /// 1-based displayed row.
    row: usize,
    patch: EditPatch,
    memento: Option<EditMemento>,
}

impl EditCommand {
    pub fn new(row: usize, patch: EditPatch) -> Result<Self, CommandError> {
        if patch.is_empty() {
            return Err(CommandError::NoEditInfo);
        }
        Ok(EditCommand {
            row,
            patch,
            memento: None,
        })
    }

    /// Overwrite the live task (found by uid) with a snapshot and re-sort.
    fn restore(ctx: &mut ExecContext, tab: ListKind, uid: u64, snapshot: &Task) {
        if let Some(task) = ctx.store.task_by_uid_mut(tab, uid) {
            *task = snapshot.clone();
            ctx.store.sort(tab);
        }
    }
}

impl Executable for EditCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let tab = ctx.tab;
        if self.row == 0 || self.row > ctx.resolver.visible_len(ctx.store, tab) {
            return Err(CommandError::IndexOutOfBounds(self.row));
        }
        let slot = ctx
            .resolver
            .resolve(ctx.store, tab, self.row - 1)
            .ok_or(CommandError::IndexOutOfBounds(self.row))?;

        let Some(before) = ctx.store.task(tab, slot).cloned() else {
            return Err(CommandError::IndexOutOfBounds(self.row));
        };

        let mut after = before.clone();
        if let Some(text) = &self.patch.text {
            after.text = text.clone();
        }
        if let Some(tag) = &self.patch.tag {
            after.tag.label = tag.clone();
        }
        if let Some(recurrence) = self.patch.recurrence {
            after.tag.recurrence = recurrence;
            if !recurrence.is_none() && after.current_occurrence == 0 {
                after.current_occurrence = 1;
            }
        }
        if let Some(n) = self.patch.occurrences {
            after.num_occurrences = n;
        }
        if let Some(start) = self.patch.start {
            after.start = Some(start);
        }
        if let Some(end) = self.patch.end {
            after.end = Some(end);
        }
        if let Some(important) = self.patch.important {
            after.important = important;
        }

        if let (Some(start), Some(end)) = (after.start, after.end)
            && end < start
        {
            return Err(CommandError::InvalidDateRange);
        }
        if !after.tag.recurrence.is_none() && (after.end.is_none() || after.num_occurrences == 0) {
            return Err(CommandError::InvalidRecurrenceWindow);
        }

        after.touch();
        let uid = before.uid;
        if let Some(task) = ctx.store.task_mut(tab, slot) {
            *task = after.clone();
        }
        ctx.store.sort(tab);

        let feedback = format!("Edited \"{}\"", after.text);
        self.memento = Some(EditMemento {
            uid,
            tab,
            before,
            after,
        });
        Ok(feedback)
    }
}

impl Reversible for EditCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let Some(m) = &self.memento else {
            return Err(CommandError::UndoUnavailable);
        };
        let (tab, uid, text) = (m.tab, m.uid, m.before.text.clone());
        let snapshot = m.before.clone();
        Self::restore(ctx, tab, uid, &snapshot);
        Ok(format!("Restored \"{}\"", text))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let Some(m) = &self.memento else {
            return Err(CommandError::RedoUnavailable);
        };
        let (tab, uid, text) = (m.tab, m.uid, m.after.text.clone());
        let snapshot = m.after.clone();
        Self::restore(ctx, tab, uid, &snapshot);
        Ok(format!("Edited \"{}\"", text))
    }
}
