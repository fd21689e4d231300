use crate::exec::add::AddCommand;
use crate::exec::batch::{
    CompleteCommand, IncompleteCommand, MarkCommand, RecoverCommand, RemoveCommand, UnmarkCommand,
};
use crate::exec::clear::ClearAllCommand;
use crate::exec::edit::EditCommand;
use crate::exec::error::CommandError;
use crate::exec::resolver::IndexResolver;
use crate::model::{ListKind, TaskStore};

/// Human-readable result of a successful command.
pub type Feedback = String;

/// Everything a command needs to run: the store, the index resolver, the
/// collection the user is looking at, and whether a sync pass is currently
/// running (which parameterizes the lifecycle transitions).
pub struct ExecContext<'a> {
    pub store: &'a mut TaskStore,
    pub resolver: &'a mut IndexResolver,
    pub tab: ListKind,
    pub sync_running: bool,
}

/// A command that can run against the store.
pub trait Executable {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError>;
}

/// A command whose effect can be exactly inverted and exactly repeated.
///
/// `undo` must restore every observable field the matching `execute`
/// changed; `redo` must reproduce the `execute` effect from the captured
/// state without re-validating.
pub trait Reversible: Executable {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError>;
    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError>;
}

/// A command that targets a set of 1-based displayed rows.
pub trait IndexTargeted {
    fn rows(&self) -> &[usize];
}

/// The closed set of undoable commands. History stores these; one-shot
/// commands (search, show, help, settings, sync, exit) never reach it.
#[derive(Debug)]
pub enum TwoWayCommand {
    Add(AddCommand),
    Edit(EditCommand),
    Remove(RemoveCommand),
    Complete(CompleteCommand),
    Incomplete(IncompleteCommand),
    Recover(RecoverCommand),
    Mark(MarkCommand),
    Unmark(UnmarkCommand),
    ClearAll(ClearAllCommand),
}

impl TwoWayCommand {
    /// Short verb for feedback strings ("Undid remove").
    pub fn verb(&self) -> &'static str {
        match self {
            TwoWayCommand::Add(_) => "add",
            TwoWayCommand::Edit(_) => "edit",
            TwoWayCommand::Remove(_) => "remove",
            TwoWayCommand::Complete(_) => "complete",
            TwoWayCommand::Incomplete(_) => "incomplete",
            TwoWayCommand::Recover(_) => "recover",
            TwoWayCommand::Mark(_) => "mark",
            TwoWayCommand::Unmark(_) => "unmark",
            TwoWayCommand::ClearAll(_) => "clear",
        }
    }

}

impl Executable for TwoWayCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        match self {
            TwoWayCommand::Add(c) => c.execute(ctx),
            TwoWayCommand::Edit(c) => c.execute(ctx),
            TwoWayCommand::Remove(c) => c.execute(ctx),
            TwoWayCommand::Complete(c) => c.execute(ctx),
            TwoWayCommand::Incomplete(c) => c.execute(ctx),
            TwoWayCommand::Recover(c) => c.execute(ctx),
            TwoWayCommand::Mark(c) => c.execute(ctx),
            TwoWayCommand::Unmark(c) => c.execute(ctx),
            TwoWayCommand::ClearAll(c) => c.execute(ctx),
        }
    }
}

impl Reversible for TwoWayCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        match self {
            TwoWayCommand::Add(c) => c.undo(ctx),
            TwoWayCommand::Edit(c) => c.undo(ctx),
            TwoWayCommand::Remove(c) => c.undo(ctx),
            TwoWayCommand::Complete(c) => c.undo(ctx),
            TwoWayCommand::Incomplete(c) => c.undo(ctx),
            TwoWayCommand::Recover(c) => c.undo(ctx),
            TwoWayCommand::Mark(c) => c.undo(ctx),
            TwoWayCommand::Unmark(c) => c.undo(ctx),
            TwoWayCommand::ClearAll(c) => c.undo(ctx),
        }
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        match self {
            TwoWayCommand::Add(c) => c.redo(ctx),
            TwoWayCommand::Edit(c) => c.redo(ctx),
            TwoWayCommand::Remove(c) => c.redo(ctx),
            TwoWayCommand::Complete(c) => c.redo(ctx),
            TwoWayCommand::Incomplete(c) => c.redo(ctx),
            TwoWayCommand::Recover(c) => c.redo(ctx),
            TwoWayCommand::Mark(c) => c.redo(ctx),
            TwoWayCommand::Unmark(c) => c.redo(ctx),
            TwoWayCommand::ClearAll(c) => c.redo(ctx),
        }
    }
}
