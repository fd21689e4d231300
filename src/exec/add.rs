use chrono::NaiveDateTime;

use crate::exec::command::{ExecContext, Executable, Feedback, Reversible};
use crate::exec::error::CommandError;
use crate::model::{ListKind, Recurrence, Task, TaskStatus};

/// Typed, pre-validated fields for a new task, as produced by the tokenizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddArgs {
    pub text: String,
    pub tag: Option<String>,
    pub recurrence: Recurrence,
    pub occurrences: Option<u32>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub important: bool,
}

/// Creates a task in the pending list. Undo erases it outright — the task
/// was never "deleted" by the user, so it takes no detour through trash.
#[derive(Debug)]
pub struct AddCommand {
    template: Task,
}

impl AddCommand {
    /// Validate the arguments and build the task template. Fails eagerly;
    /// nothing is mutated until `execute`.
    pub fn new(args: AddArgs) -> Result<Self, CommandError> {
        if let (Some(start), Some(end)) = (args.start, args.end)
            && end < start
        {
            return Err(CommandError::InvalidDateRange);
        }
        if !args.recurrence.is_none() && (args.end.is_none() || args.occurrences.unwrap_or(0) == 0)
        {
            return Err(CommandError::InvalidRecurrenceWindow);
        }

        let mut template = Task::new(args.text);
        template.tag.label = args.tag.unwrap_or_default();
        template.tag.recurrence = args.recurrence;
        template.start = args.start;
        template.end = args.end;
        template.important = args.important;
        if !args.recurrence.is_none() {
            template.current_occurrence = 1;
            template.num_occurrences = args.occurrences.unwrap_or(0);
        }
        Ok(AddCommand { template })
    }

    fn insert(&mut self, ctx: &mut ExecContext) -> Feedback {
        let mut task = self.template.clone();
        task.status = TaskStatus::created(ctx.sync_running);
        task.touch();
        let uid = ctx.store.insert(ListKind::Pending, task);
        // Remember the identity so undo/redo keep tracking the same task.
        self.template.uid = uid;
        format!("Added \"{}\"", self.template.text)
    }
}

impl Executable for AddCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        Ok(self.insert(ctx))
    }
}

impl Reversible for AddCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        ctx.store.remove_uid(ListKind::Pending, self.template.uid);
        Ok(format!("Removed \"{}\"", self.template.text))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        Ok(self.insert(ctx))
    }
}
