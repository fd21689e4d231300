use crate::exec::command::{ExecContext, Executable, Feedback, Reversible};
use crate::exec::error::CommandError;
use crate::exec::resolver::ViewMode;
use crate::model::{ListKind, Task};

/// Before/after copies of every collection the clear touched. Clearing
/// pending or completed also appends to trash, so trash is snapshotted as
/// well — undo must restore its exact prior contents, not just re-insert
/// the cleared tasks.
#[derive(Debug)]
struct ClearMemento {
    tab: ListKind,
    source_before: Vec<Task>,
    source_after: Vec<Task>,
    trash_before: Vec<Task>,
    trash_after: Vec<Task>,
    cleared: usize,
}

/// Empties the collection the user is looking at. With a search active only
/// the searched rows are cleared. Clearing the trash erases permanently;
/// clearing pending/completed trashes with the usual lifecycle transition.
#[derive(Debug, Default)]
pub struct ClearAllCommand {
    memento: Option<ClearMemento>,
}

impl ClearAllCommand {
    pub fn new() -> Self {
        ClearAllCommand::default()
    }

    fn install(ctx: &mut ExecContext, tab: ListKind, source: &[Task], trash: &[Task]) {
        ctx.store.replace(tab, source.to_vec());
        if tab != ListKind::Trash {
            ctx.store.replace(ListKind::Trash, trash.to_vec());
        }
    }
}

impl Executable for ClearAllCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let tab = ctx.tab;
        let source_before = ctx.store.list(tab).to_vec();
        let trash_before = ctx.store.list(ListKind::Trash).to_vec();

        // Which uids go: the whole collection, or just the searched rows.
        let doomed: Vec<u64> = match ctx.resolver.mode() {
            ViewMode::Shown => source_before.iter().map(|t| t.uid).collect(),
            ViewMode::Searched => ctx.store.search_view(tab).to_vec(),
        };

        let mut cleared = 0;
        for &uid in &doomed {
            let Some(mut task) = ctx.store.remove_uid(tab, uid) else {
                continue;
            };
            cleared += 1;
            if tab != ListKind::Trash {
                task.status = task.status.trashed(ctx.sync_running);
                ctx.store.insert(ListKind::Trash, task);
            }
            // Clearing the trash itself destroys the task.
        }
        ctx.store.sort(tab);
        self.memento = Some(ClearMemento {
            tab,
            source_after: ctx.store.list(tab).to_vec(),
            trash_after: ctx.store.list(ListKind::Trash).to_vec(),
            source_before,
            trash_before,
            cleared,
        });
        Ok(format!("Cleared {} tasks from {}", cleared, tab.name()))
    }
}

impl Reversible for ClearAllCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let Some(m) = &self.memento else {
            return Err(CommandError::UndoUnavailable);
        };
        let (tab, source, trash) = (m.tab, m.source_before.clone(), m.trash_before.clone());
        let cleared = m.cleared;
        Self::install(ctx, tab, &source, &trash);
        Ok(format!("Restored {} tasks to {}", cleared, tab.name()))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let Some(m) = &self.memento else {
            return Err(CommandError::RedoUnavailable);
        };
        let (tab, source, trash) = (m.tab, m.source_after.clone(), m.trash_after.clone());
        let cleared = m.cleared;
        Self::install(ctx, tab, &source, &trash);
        Ok(format!("Cleared {} tasks from {}", cleared, tab.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::resolver::IndexResolver;
    use crate::model::{TaskStatus, TaskStore};

    fn ctx<'a>(
        store: &'a mut TaskStore,
        resolver: &'a mut IndexResolver,
        tab: ListKind,
    ) -> ExecContext<'a> {
        ExecContext {
            store,
            resolver,
            tab,
            sync_running: false,
        }
    }

    fn store_with_pending(names: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        for name in names {
            let mut t = Task::new(*name);
            t.status = TaskStatus::Unchanged;
            store.insert(ListKind::Pending, t);
        }
        store
    }

    #[test]
    fn clear_trashes_the_whole_tab() {
        let mut store = store_with_pending(&["a", "b", "c"]);
        let mut resolver = IndexResolver::new();
        let fb = ClearAllCommand::new()
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(fb, "Cleared 3 tasks from pending");
        assert!(store.list(ListKind::Pending).is_empty());
        assert_eq!(store.len(ListKind::Trash), 3);
        assert!(
            store
                .list(ListKind::Trash)
                .iter()
                .all(|t| t.status == TaskStatus::Deleted)
        );
    }

    #[test]
    fn clear_trash_erases_permanently() {
        let mut store = TaskStore::new();
        store.insert(ListKind::Trash, Task::new("junk"));
        let mut resolver = IndexResolver::new();
        ClearAllCommand::new()
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Trash))
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn undo_restores_both_source_and_trash_exactly() {
        let mut store = store_with_pending(&["a", "b"]);
        // Pre-existing trash content must survive the round trip untouched.
        let mut old = Task::new("old junk");
        old.status = TaskStatus::Deleted;
        store.insert(ListKind::Trash, old);
        let pending_before = store.list(ListKind::Pending).to_vec();
        let trash_before = store.list(ListKind::Trash).to_vec();

        let mut resolver = IndexResolver::new();
        let mut cmd = ClearAllCommand::new();
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(store.len(ListKind::Trash), 3);

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(store.list(ListKind::Pending), &pending_before[..]);
        assert_eq!(store.list(ListKind::Trash), &trash_before[..]);
    }

    #[test]
    fn redo_reclears() {
        let mut store = store_with_pending(&["a", "b"]);
        let mut resolver = IndexResolver::new();
        let mut cmd = ClearAllCommand::new();
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        cmd.redo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert!(store.list(ListKind::Pending).is_empty());
        assert_eq!(store.len(ListKind::Trash), 2);
    }

    #[test]
    fn searched_clear_only_takes_the_hits() {
        let mut store = store_with_pending(&["apple", "banana", "apricot"]);
        let hits: Vec<u64> = store
            .list(ListKind::Pending)
            .iter()
            .filter(|t| t.text.starts_with("ap"))
            .map(|t| t.uid)
            .collect();
        store.set_search_views(hits, Vec::new(), Vec::new());

        let mut resolver = IndexResolver::new();
        resolver.set_mode(ViewMode::Searched);
        ClearAllCommand::new()
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();

        let left: Vec<_> = store
            .list(ListKind::Pending)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(left, ["banana"]);
        assert_eq!(store.len(ListKind::Trash), 2);
    }
}
