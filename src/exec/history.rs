use crate::exec::command::{ExecContext, Feedback, Reversible, TwoWayCommand};
use crate::exec::error::CommandError;
use crate::exec::resolver::ViewMode;

const UNDO_STACK_LIMIT: usize = 500;

/// A recorded command plus the view mode that was active when it ran.
/// Undo/redo restore that mode first, so a command recorded against a
/// search view is never replayed against the full list.
#[derive(Debug)]
pub struct HistoryEntry {
    pub command: TwoWayCommand,
    pub mode: ViewMode,
}

/// The undo/redo stacks. Recording a new command invalidates any previously
/// undone branch; a completed sync pass invalidates everything (its
/// out-of-band edits make older snapshots unsafe to replay).
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: UNDO_STACK_LIMIT,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        History {
            limit: limit.max(1),
            ..History::new()
        }
    }

    /// Record a successfully executed command. Clears the redo stack.
    pub fn record(&mut self, command: TwoWayCommand, mode: ViewMode) {
        self.undo.push(HistoryEntry { command, mode });
        if self.undo.len() > self.limit {
            self.undo.drain(..self.undo.len() - self.limit);
        }
        self.redo.clear();
    }

    /// Invert the most recent command. The entry moves to the redo stack.
    pub fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let mut entry = self.undo.pop().ok_or(CommandError::UndoUnavailable)?;
        ctx.resolver.set_mode(entry.mode);
        match entry.command.undo(ctx) {
            Ok(feedback) => {
                self.redo.push(entry);
                Ok(format!("Undid {}: {}", entry_verb(&self.redo), feedback))
            }
            Err(e) => {
                self.undo.push(entry);
                Err(e)
            }
        }
    }

    /// Repeat the most recently undone command. The entry moves back to the
    /// undo stack.
    pub fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let mut entry = self.redo.pop().ok_or(CommandError::RedoUnavailable)?;
        ctx.resolver.set_mode(entry.mode);
        match entry.command.redo(ctx) {
            Ok(feedback) => {
                self.undo.push(entry);
                Ok(format!("Redid {}: {}", entry_verb(&self.undo), feedback))
            }
            Err(e) => {
                self.redo.push(entry);
                Err(e)
            }
        }
    }

    /// Drop everything. Called after a successful sync pass.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Change the bound, trimming the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        if self.undo.len() > self.limit {
            self.undo.drain(..self.undo.len() - self.limit);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

fn entry_verb(stack: &[HistoryEntry]) -> &'static str {
    stack.last().map(|e| e.command.verb()).unwrap_or("command")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::add::{AddArgs, AddCommand};
    use crate::exec::batch::RemoveCommand;
    use crate::exec::command::Executable;
    use crate::exec::resolver::IndexResolver;
    use crate::model::{ListKind, TaskStore};

    fn add(text: &str) -> TwoWayCommand {
        TwoWayCommand::Add(
            AddCommand::new(AddArgs {
                text: text.into(),
                ..AddArgs::default()
            })
            .unwrap(),
        )
    }

    fn ctx<'a>(store: &'a mut TaskStore, resolver: &'a mut IndexResolver) -> ExecContext<'a> {
        ExecContext {
            store,
            resolver,
            tab: ListKind::Pending,
            sync_running: false,
        }
    }

    #[test]
    fn undo_on_empty_history_is_unavailable() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();
        assert_eq!(
            history.undo(&mut ctx(&mut store, &mut resolver)).unwrap_err(),
            CommandError::UndoUnavailable
        );
        assert_eq!(
            history.redo(&mut ctx(&mut store, &mut resolver)).unwrap_err(),
            CommandError::RedoUnavailable
        );
    }

    #[test]
    fn record_clears_the_redo_branch() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        let mut cmd = add("one");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);
        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert!(history.can_redo());

        let mut cmd = add("two");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_then_redo_round_trips_the_store() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        let mut cmd = add("task");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);

        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert!(store.is_empty());
        history.redo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert_eq!(store.len(ListKind::Pending), 1);
    }

    #[test]
    fn undo_restores_the_recorded_mode() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        let mut cmd = add("task");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Searched);

        // User navigated away from the search since.
        resolver.set_mode(ViewMode::Shown);
        // Give the resolver a view so Searched mode is coherent.
        let uid = store.list(ListKind::Pending)[0].uid;
        store.set_search_views(vec![uid], Vec::new(), Vec::new());

        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert_eq!(resolver.mode(), ViewMode::Searched);
    }

    #[test]
    fn stack_is_bounded_oldest_entries_drop() {
        let mut history = History::with_limit(2);
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        for name in ["a", "b", "c"] {
            let mut cmd = add(name);
            cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
            history.record(cmd, ViewMode::Shown);
        }
        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        // The third undo hits the dropped entry.
        assert_eq!(
            history.undo(&mut ctx(&mut store, &mut resolver)).unwrap_err(),
            CommandError::UndoUnavailable
        );
        assert_eq!(store.len(ListKind::Pending), 1, "\"a\" survives");
    }

    #[test]
    fn clear_drops_both_stacks() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        let mut cmd = add("a");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);
        let mut cmd = add("b");
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);
        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_redo_move_entries_between_stacks_in_pairs() {
        let mut history = History::new();
        let mut store = TaskStore::new();
        let mut resolver = IndexResolver::new();

        let mut cmd = TwoWayCommand::Remove(RemoveCommand::new(vec![1]));
        store.insert(ListKind::Pending, crate::model::Task::new("x"));
        cmd.execute(&mut ctx(&mut store, &mut resolver)).unwrap();
        history.record(cmd, ViewMode::Shown);

        history.undo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert!(history.can_redo());
        assert!(!history.can_undo());
        history.redo(&mut ctx(&mut store, &mut resolver)).unwrap();
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }
}
