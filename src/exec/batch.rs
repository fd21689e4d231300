//! The row-targeted commands: remove, recover, complete, incomplete, mark,
//! unmark. All share the same contract: rows are validated up front
//! (sorted, deduplicated, bounds-checked), then processed in descending
//! order so that moving a task never shifts a row that is still waiting its
//! turn. Each command keeps a buffer of what it did, in encounter order;
//! undo replays the buffer backwards, redo forwards.

use crate::exec::command::{ExecContext, Executable, Feedback, IndexTargeted, Reversible};
use crate::exec::error::CommandError;
use crate::model::{ListKind, Task};

// ---------------------------------------------------------------------------
// Shared machinery
// ---------------------------------------------------------------------------

/// Sort the requested 1-based rows ascending, reject duplicates, and check
/// the minimum and maximum against the resolver's visible length.
fn checked_rows(ctx: &ExecContext, rows: &[usize]) -> Result<Vec<usize>, CommandError> {
    let mut sorted = rows.to_vec();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(CommandError::DuplicateIndex(pair[0]));
        }
    }
    if let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) {
        if min == 0 {
            return Err(CommandError::IndexOutOfBounds(0));
        }
        let visible = ctx.resolver.visible_len(ctx.store, ctx.tab);
        if max > visible {
            return Err(CommandError::IndexOutOfBounds(max));
        }
    }
    Ok(sorted)
}

/// Resolve one 1-based row to a canonical slot, at processing time.
fn resolve_row(ctx: &ExecContext, row: usize) -> Result<usize, CommandError> {
    ctx.resolver
        .resolve(ctx.store, ctx.tab, row - 1)
        .ok_or(CommandError::IndexOutOfBounds(row))
}

fn guard_tab(op: &'static str, tab: ListKind, allowed: &[ListKind]) -> Result<(), CommandError> {
    if allowed.contains(&tab) {
        Ok(())
    } else {
        Err(CommandError::WrongTab {
            op,
            tab: tab.name(),
        })
    }
}

fn count(n: usize) -> String {
    if n == 1 {
        "1 task".to_string()
    } else {
        format!("{} tasks", n)
    }
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// Moves tasks from pending/completed into the trash, applying the
/// lifecycle transition as they go.
#[derive(Debug)]
pub struct RemoveCommand {
    rows: Vec<usize>,
    /// (uid, source collection), in encounter order.
    moved: Vec<(u64, ListKind)>,
}

impl RemoveCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        RemoveCommand {
            rows,
            moved: Vec::new(),
        }
    }
}

impl IndexTargeted for RemoveCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for RemoveCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        guard_tab("remove", ctx.tab, &[ListKind::Pending, ListKind::Completed])?;
        let rows = checked_rows(ctx, &self.rows)?;
        self.moved.clear();
        for &row in rows.iter().rev() {
            let slot = resolve_row(ctx, row)?;
            let Some(mut task) = ctx.store.remove_at(ctx.tab, slot) else {
                return Err(CommandError::IndexOutOfBounds(row));
            };
            task.status = task.status.trashed(ctx.sync_running);
            let uid = ctx.store.insert(ListKind::Trash, task);
            self.moved.push((uid, ctx.tab));
        }
        ctx.store.sort(ctx.tab);
        Ok(format!("Moved {} to trash", count(self.moved.len())))
    }
}

impl Reversible for RemoveCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &(uid, from) in self.moved.iter().rev() {
            if let Some(mut task) = ctx.store.remove_uid(ListKind::Trash, uid) {
                task.status = task.status.restored(ctx.sync_running);
                ctx.store.insert(from, task);
            }
        }
        Ok(format!("Restored {} from trash", count(self.moved.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &(uid, from) in self.moved.iter() {
            if let Some(mut task) = ctx.store.remove_uid(from, uid) {
                task.status = task.status.trashed(ctx.sync_running);
                ctx.store.insert(ListKind::Trash, task);
            }
        }
        Ok(format!("Moved {} to trash", count(self.moved.len())))
    }
}

// ---------------------------------------------------------------------------
// Recover
// ---------------------------------------------------------------------------

/// Restores trashed tasks into the pending list.
#[derive(Debug)]
pub struct RecoverCommand {
    rows: Vec<usize>,
    recovered: Vec<u64>,
}

impl RecoverCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        RecoverCommand {
            rows,
            recovered: Vec::new(),
        }
    }
}

impl IndexTargeted for RecoverCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for RecoverCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        guard_tab("recover", ctx.tab, &[ListKind::Trash])?;
        let rows = checked_rows(ctx, &self.rows)?;
        self.recovered.clear();
        for &row in rows.iter().rev() {
            let slot = resolve_row(ctx, row)?;
            let Some(mut task) = ctx.store.remove_at(ListKind::Trash, slot) else {
                return Err(CommandError::IndexOutOfBounds(row));
            };
            task.status = task.status.restored(ctx.sync_running);
            let uid = ctx.store.insert(ListKind::Pending, task);
            self.recovered.push(uid);
        }
        ctx.store.sort(ListKind::Trash);
        Ok(format!("Recovered {}", count(self.recovered.len())))
    }
}

impl Reversible for RecoverCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &uid in self.recovered.iter().rev() {
            if let Some(mut task) = ctx.store.remove_uid(ListKind::Pending, uid) {
                task.status = task.status.trashed(ctx.sync_running);
                ctx.store.insert(ListKind::Trash, task);
            }
        }
        Ok(format!("Moved {} back to trash", count(self.recovered.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &uid in self.recovered.iter() {
            if let Some(mut task) = ctx.store.remove_uid(ListKind::Trash, uid) {
                task.status = task.status.restored(ctx.sync_running);
                ctx.store.insert(ListKind::Pending, task);
            }
        }
        Ok(format!("Recovered {}", count(self.recovered.len())))
    }
}

// ---------------------------------------------------------------------------
// Complete / Incomplete
// ---------------------------------------------------------------------------

/// What completing one row did. A recurring task with occurrences left is
/// advanced in place instead of moved; undo needs to know which happened.
#[derive(Debug)]
enum Completion {
    Moved { uid: u64 },
    Advanced { uid: u64, before: Task, after: Task },
}

/// Completes pending tasks: moves them to the completed list, or advances a
/// recurring task to its next occurrence.
#[derive(Debug)]
pub struct CompleteCommand {
    rows: Vec<usize>,
    outcomes: Vec<Completion>,
}

impl CompleteCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        CompleteCommand {
            rows,
            outcomes: Vec::new(),
        }
    }
}

impl IndexTargeted for CompleteCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for CompleteCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        guard_tab("complete", ctx.tab, &[ListKind::Pending])?;
        let rows = checked_rows(ctx, &self.rows)?;
        self.outcomes.clear();
        for &row in rows.iter().rev() {
            let slot = resolve_row(ctx, row)?;
            let advances = ctx
                .store
                .task(ListKind::Pending, slot)
                .is_some_and(Task::has_remaining_occurrences);
            if advances {
                let Some(task) = ctx.store.task_mut(ListKind::Pending, slot) else {
                    return Err(CommandError::IndexOutOfBounds(row));
                };
                let before = task.clone();
                let period = task.tag.recurrence;
                task.current_occurrence += 1;
                task.start = task.start.map(|t| period.advance(t));
                task.end = task.end.map(|t| period.advance(t));
                self.outcomes.push(Completion::Advanced {
                    uid: task.uid,
                    before,
                    after: task.clone(),
                });
            } else {
                let Some(task) = ctx.store.remove_at(ListKind::Pending, slot) else {
                    return Err(CommandError::IndexOutOfBounds(row));
                };
                let uid = ctx.store.insert(ListKind::Completed, task);
                self.outcomes.push(Completion::Moved { uid });
            }
        }
        ctx.store.sort(ListKind::Pending);
        Ok(format!("Completed {}", count(self.outcomes.len())))
    }
}

impl Reversible for CompleteCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for outcome in self.outcomes.iter().rev() {
            match outcome {
                Completion::Moved { uid } => {
                    if let Some(task) = ctx.store.remove_uid(ListKind::Completed, *uid) {
                        ctx.store.insert(ListKind::Pending, task);
                    }
                }
                Completion::Advanced { uid, before, .. } => {
                    if let Some(task) = ctx.store.task_by_uid_mut(ListKind::Pending, *uid) {
                        *task = before.clone();
                    }
                }
            }
        }
        ctx.store.sort(ListKind::Pending);
        Ok(format!("Reopened {}", count(self.outcomes.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for outcome in self.outcomes.iter() {
            match outcome {
                Completion::Moved { uid } => {
                    if let Some(task) = ctx.store.remove_uid(ListKind::Pending, *uid) {
                        ctx.store.insert(ListKind::Completed, task);
                    }
                }
                Completion::Advanced { uid, after, .. } => {
                    if let Some(task) = ctx.store.task_by_uid_mut(ListKind::Pending, *uid) {
                        *task = after.clone();
                    }
                }
            }
        }
        ctx.store.sort(ListKind::Pending);
        Ok(format!("Completed {}", count(self.outcomes.len())))
    }
}

/// Moves completed tasks back to pending.
#[derive(Debug)]
pub struct IncompleteCommand {
    rows: Vec<usize>,
    moved: Vec<u64>,
}

impl IncompleteCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        IncompleteCommand {
            rows,
            moved: Vec::new(),
        }
    }
}

impl IndexTargeted for IncompleteCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for IncompleteCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        guard_tab("incomplete", ctx.tab, &[ListKind::Completed])?;
        let rows = checked_rows(ctx, &self.rows)?;
        self.moved.clear();
        for &row in rows.iter().rev() {
            let slot = resolve_row(ctx, row)?;
            let Some(task) = ctx.store.remove_at(ListKind::Completed, slot) else {
                return Err(CommandError::IndexOutOfBounds(row));
            };
            let uid = ctx.store.insert(ListKind::Pending, task);
            self.moved.push(uid);
        }
        ctx.store.sort(ListKind::Completed);
        Ok(format!("Moved {} back to pending", count(self.moved.len())))
    }
}

impl Reversible for IncompleteCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &uid in self.moved.iter().rev() {
            if let Some(task) = ctx.store.remove_uid(ListKind::Pending, uid) {
                ctx.store.insert(ListKind::Completed, task);
            }
        }
        Ok(format!("Completed {}", count(self.moved.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        for &uid in self.moved.iter() {
            if let Some(task) = ctx.store.remove_uid(ListKind::Completed, uid) {
                ctx.store.insert(ListKind::Pending, task);
            }
        }
        Ok(format!("Moved {} back to pending", count(self.moved.len())))
    }
}

// ---------------------------------------------------------------------------
// Mark / Unmark
// ---------------------------------------------------------------------------

/// Set the importance flag on a batch of rows, remembering each task's
/// prior flag so undo restores exactly what was there.
fn set_importance(
    ctx: &mut ExecContext,
    rows: &[usize],
    value: bool,
    prior: &mut Vec<(u64, bool)>,
) -> Result<usize, CommandError> {
    let rows = checked_rows(ctx, rows)?;
    prior.clear();
    for &row in rows.iter().rev() {
        let slot = resolve_row(ctx, row)?;
        let Some(task) = ctx.store.task_mut(ctx.tab, slot) else {
            return Err(CommandError::IndexOutOfBounds(row));
        };
        prior.push((task.uid, task.important));
        task.important = value;
    }
    Ok(prior.len())
}

fn restore_importance(ctx: &mut ExecContext, prior: &[(u64, bool)]) {
    for &(uid, was) in prior.iter().rev() {
        if let Some(task) = ctx.store.task_by_uid_mut(ctx.tab, uid) {
            task.important = was;
        }
    }
}

fn reapply_importance(ctx: &mut ExecContext, prior: &[(u64, bool)], value: bool) {
    for &(uid, _) in prior.iter() {
        if let Some(task) = ctx.store.task_by_uid_mut(ctx.tab, uid) {
            task.important = value;
        }
    }
}

/// Flags tasks as important.
#[derive(Debug)]
pub struct MarkCommand {
    rows: Vec<usize>,
    prior: Vec<(u64, bool)>,
}

impl MarkCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        MarkCommand {
            rows,
            prior: Vec::new(),
        }
    }
}

impl IndexTargeted for MarkCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for MarkCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let rows = self.rows.clone();
        let n = set_importance(ctx, &rows, true, &mut self.prior)?;
        Ok(format!("Marked {} as important", count(n)))
    }
}

impl Reversible for MarkCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        restore_importance(ctx, &self.prior);
        Ok(format!("Unmarked {}", count(self.prior.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        reapply_importance(ctx, &self.prior, true);
        Ok(format!("Marked {} as important", count(self.prior.len())))
    }
}

/// Clears the importance flag.
#[derive(Debug)]
pub struct UnmarkCommand {
    rows: Vec<usize>,
    prior: Vec<(u64, bool)>,
}

impl UnmarkCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        UnmarkCommand {
            rows,
            prior: Vec::new(),
        }
    }
}

impl IndexTargeted for UnmarkCommand {
    fn rows(&self) -> &[usize] {
        &self.rows
    }
}

impl Executable for UnmarkCommand {
    fn execute(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        let rows = self.rows.clone();
        let n = set_importance(ctx, &rows, false, &mut self.prior)?;
        Ok(format!("Unmarked {}", count(n)))
    }
}

impl Reversible for UnmarkCommand {
    fn undo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        restore_importance(ctx, &self.prior);
        Ok(format!("Restored importance on {}", count(self.prior.len())))
    }

    fn redo(&mut self, ctx: &mut ExecContext) -> Result<Feedback, CommandError> {
        reapply_importance(ctx, &self.prior, false);
        Ok(format!("Unmarked {}", count(self.prior.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::resolver::{IndexResolver, ViewMode};
    use crate::model::{Recurrence, TaskStatus, TaskStore};
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDateTime {
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn dated(text: &str, end: &str) -> Task {
        let mut t = Task::new(text);
        t.end = Some(date(end));
        t
    }

    /// Pending list [a, b, c, d, e, f] with increasing end dates.
    fn six_row_store() -> TaskStore {
        let mut store = TaskStore::new();
        for (i, name) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            store.insert(
                ListKind::Pending,
                dated(name, &format!("2026-01-{:02}", i + 1)),
            );
        }
        store
    }

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

    fn texts(store: &TaskStore, kind: ListKind) -> Vec<String> {
        store.list(kind).iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();
        let mut cmd = MarkCommand::new(vec![3, 3]);
        let err = cmd
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateIndex(3));
    }

    #[test]
    fn out_of_bounds_row_is_rejected_before_any_mutation() {
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();
        let mut cmd = RemoveCommand::new(vec![2, 99]);
        let err = cmd
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap_err();
        assert_eq!(err, CommandError::IndexOutOfBounds(99));
        assert_eq!(store.len(ListKind::Pending), 6, "nothing was removed");
    }

    #[test]
    fn row_zero_is_rejected() {
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();
        let mut cmd = RemoveCommand::new(vec![0, 1]);
        let err = cmd
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap_err();
        assert_eq!(err, CommandError::IndexOutOfBounds(0));
    }

    #[test]
    fn batch_removal_matches_one_at_a_time_highest_first() {
        // Removing {2, 4, 5} in one batch ...
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();
        RemoveCommand::new(vec![2, 4, 5])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        let batch = texts(&store, ListKind::Pending);

        // ... equals removing 5, then 4, then 2 one at a time.
        let mut store = six_row_store();
        for row in [5, 4, 2] {
            RemoveCommand::new(vec![row])
                .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
                .unwrap();
        }
        assert_eq!(batch, texts(&store, ListKind::Pending));
        assert_eq!(batch, ["a", "c", "f"]);
    }

    #[test]
    fn remove_on_trash_tab_is_a_wrong_tab_error() {
        let mut store = TaskStore::new();
        store.insert(ListKind::Trash, Task::new("t"));
        let mut resolver = IndexResolver::new();
        let err = RemoveCommand::new(vec![1])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Trash))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::WrongTab {
                op: "remove",
                tab: "trash"
            }
        );
    }

    #[test]
    fn complete_requires_the_pending_tab() {
        let mut store = TaskStore::new();
        store.insert(ListKind::Completed, Task::new("done"));
        let mut resolver = IndexResolver::new();
        let err = CompleteCommand::new(vec![1])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Completed))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::WrongTab {
                op: "complete",
                tab: "completed"
            }
        );
    }

    #[test]
    fn recover_requires_the_trash_tab() {
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();
        let err = RecoverCommand::new(vec![1])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::WrongTab {
                op: "recover",
                tab: "pending"
            }
        );
    }

    #[test]
    fn remove_undo_redo_round_trip() {
        let mut store = TaskStore::new();
        for (name, end) in [("A", "2026-01-01"), ("B", "2026-01-02"), ("C", "2026-01-03")] {
            let mut t = dated(name, end);
            t.status = TaskStatus::Unchanged;
            store.insert(ListKind::Pending, t);
        }
        let mut resolver = IndexResolver::new();

        let mut cmd = RemoveCommand::new(vec![2]);
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(texts(&store, ListKind::Pending), ["A", "C"]);
        assert_eq!(store.list(ListKind::Trash)[0].status, TaskStatus::Deleted);

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(texts(&store, ListKind::Pending), ["A", "B", "C"]);
        assert!(store.list(ListKind::Trash).is_empty());
        assert_eq!(
            store.list(ListKind::Pending)[1].status,
            TaskStatus::Unchanged
        );

        cmd.redo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(texts(&store, ListKind::Pending), ["A", "C"]);
        assert_eq!(store.list(ListKind::Trash)[0].status, TaskStatus::Deleted);
    }

    #[test]
    fn remove_undo_restores_newly_added_status() {
        let mut store = TaskStore::new();
        store.insert(ListKind::Pending, Task::new("fresh"));
        assert_eq!(
            store.list(ListKind::Pending)[0].status,
            TaskStatus::NewlyAdded
        );
        let mut resolver = IndexResolver::new();

        let mut cmd = RemoveCommand::new(vec![1]);
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        // Never synced: trashing leaves no deletion record.
        assert_eq!(store.list(ListKind::Trash)[0].status, TaskStatus::Unchanged);

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(
            store.list(ListKind::Pending)[0].status,
            TaskStatus::NewlyAdded,
            "round trip must not launder NewlyAdded into Unchanged"
        );
    }

    #[test]
    fn searched_mode_targets_the_view_not_the_canonical_row() {
        let mut store = six_row_store();
        // Search hits: d (canonical slot 3) and f (canonical slot 5).
        let d = store.list(ListKind::Pending)[3].uid;
        let f = store.list(ListKind::Pending)[5].uid;
        store.set_search_views(vec![d, f], Vec::new(), Vec::new());

        let mut resolver = IndexResolver::new();
        resolver.set_mode(ViewMode::Searched);

        RemoveCommand::new(vec![2])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        // Displayed row 2 of the search is "f", not canonical row 2 ("b").
        assert_eq!(texts(&store, ListKind::Pending), ["a", "b", "c", "d", "e"]);
        assert_eq!(texts(&store, ListKind::Trash), ["f"]);
    }

    #[test]
    fn complete_moves_and_incomplete_moves_back() {
        let mut store = six_row_store();
        let mut resolver = IndexResolver::new();

        CompleteCommand::new(vec![1, 3])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert_eq!(texts(&store, ListKind::Pending), ["b", "d", "e", "f"]);
        assert_eq!(texts(&store, ListKind::Completed), ["a", "c"]);

        IncompleteCommand::new(vec![2])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Completed))
            .unwrap();
        assert_eq!(texts(&store, ListKind::Completed), ["a"]);
        assert!(texts(&store, ListKind::Pending).contains(&"c".to_string()));
    }

    #[test]
    fn completing_a_recurring_task_advances_it_in_place() {
        let mut store = TaskStore::new();
        let mut t = dated("standup", "2026-01-05");
        t.tag.recurrence = Recurrence::Weekly;
        t.current_occurrence = 1;
        t.num_occurrences = 3;
        store.insert(ListKind::Pending, t);
        let mut resolver = IndexResolver::new();

        let mut cmd = CompleteCommand::new(vec![1]);
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();

        let task = &store.list(ListKind::Pending)[0];
        assert_eq!(task.current_occurrence, 2);
        assert_eq!(task.end, Some(date("2026-01-12")));
        assert!(store.list(ListKind::Completed).is_empty());

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        let task = &store.list(ListKind::Pending)[0];
        assert_eq!(task.current_occurrence, 1);
        assert_eq!(task.end, Some(date("2026-01-05")));
    }

    #[test]
    fn final_occurrence_completes_normally() {
        let mut store = TaskStore::new();
        let mut t = dated("standup", "2026-01-05");
        t.tag.recurrence = Recurrence::Weekly;
        t.current_occurrence = 3;
        t.num_occurrences = 3;
        store.insert(ListKind::Pending, t);
        let mut resolver = IndexResolver::new();

        CompleteCommand::new(vec![1])
            .execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert!(store.list(ListKind::Pending).is_empty());
        assert_eq!(texts(&store, ListKind::Completed), ["standup"]);
    }

    #[test]
    fn mark_undo_restores_prior_flags() {
        let mut store = six_row_store();
        // Row 2 is already important.
        store.task_mut(ListKind::Pending, 1).unwrap().important = true;
        let mut resolver = IndexResolver::new();

        let mut cmd = MarkCommand::new(vec![1, 2]);
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert!(store.list(ListKind::Pending)[0].important);
        assert!(store.list(ListKind::Pending)[1].important);

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Pending))
            .unwrap();
        assert!(!store.list(ListKind::Pending)[0].important);
        assert!(
            store.list(ListKind::Pending)[1].important,
            "the pre-existing flag survives the round trip"
        );
    }

    #[test]
    fn recover_round_trip() {
        let mut store = TaskStore::new();
        let mut t = Task::new("gone");
        t.status = TaskStatus::Deleted;
        store.insert(ListKind::Trash, t);
        let mut resolver = IndexResolver::new();

        let mut cmd = RecoverCommand::new(vec![1]);
        cmd.execute(&mut ctx(&mut store, &mut resolver, ListKind::Trash))
            .unwrap();
        assert_eq!(
            store.list(ListKind::Pending)[0].status,
            TaskStatus::Unchanged
        );

        cmd.undo(&mut ctx(&mut store, &mut resolver, ListKind::Trash))
            .unwrap();
        assert_eq!(store.list(ListKind::Trash)[0].status, TaskStatus::Deleted);
        assert!(store.list(ListKind::Pending).is_empty());
    }
}
