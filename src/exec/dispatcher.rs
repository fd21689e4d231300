use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use log::{info, warn};
use regex::Regex;

use crate::exec::add::AddCommand;
use crate::exec::batch::{
    CompleteCommand, IncompleteCommand, MarkCommand, RecoverCommand, RemoveCommand, UnmarkCommand,
};
use crate::exec::clear::ClearAllCommand;
use crate::exec::command::{ExecContext, Executable, Feedback, TwoWayCommand};
use crate::exec::edit::EditCommand;
use crate::exec::error::CommandError;
use crate::exec::history::History;
use crate::exec::resolver::{IndexResolver, ViewMode};
use crate::io::settings::{self, Settings};
use crate::io::storage::{self, StorageError};
use crate::model::{ListKind, Task, TaskStore};
use crate::sync::{FeedProvider, SyncHandle, spawn_pass};

const TASKS_FILE: &str = "tasks.json";
const SETTINGS_FILE: &str = "settings.toml";

/// The engine's entry point: receives pre-parsed commands, executes them
/// under the store lock, records the undoable ones, and persists after
/// every successful mutation.
pub struct Dispatcher {
    store: Arc<Mutex<TaskStore>>,
    resolver: IndexResolver,
    history: History,
    tab: ListKind,
    sync: SyncHandle,
    /// Pass counter already folded into history (see `fold_completed_sync`).
    seen_passes: u64,
    data_path: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    settings: Settings,
    sync_thread: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// An in-memory dispatcher: no files, no sync feed. Used by tests and
    /// by `--ephemeral` runs.
    pub fn in_memory() -> Self {
        Dispatcher::with_store(TaskStore::new())
    }

    pub fn with_store(store: TaskStore) -> Self {
        Dispatcher {
            store: Arc::new(Mutex::new(store)),
            resolver: IndexResolver::new(),
            history: History::new(),
            tab: ListKind::Pending,
            sync: SyncHandle::new(),
            seen_passes: 0,
            data_path: None,
            settings_path: None,
            settings: Settings::default(),
            sync_thread: None,
        }
    }

    /// Open a data directory: load the task snapshot and settings.
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let data_path = data_dir.join(TASKS_FILE);
        let settings_path = data_dir.join(SETTINGS_FILE);
        let store = storage::load(&data_path)?;
        let settings = match settings::load(&settings_path) {
            Ok(s) => s,
            Err(e) => {
                warn!("ignoring settings file: {}", e);
                Settings::default()
            }
        };

        let mut dispatcher = Dispatcher::with_store(store);
        dispatcher.history = History::with_limit(settings.history_limit);
        dispatcher.data_path = Some(data_path);
        dispatcher.settings_path = Some(settings_path);
        dispatcher.settings = settings;
        Ok(dispatcher)
    }

    pub fn tab(&self) -> ListKind {
        self.tab
    }

    pub fn mode(&self) -> ViewMode {
        self.resolver.mode()
    }

    /// Shared handle to the store, for the sync pass and for tests.
    pub fn store(&self) -> Arc<Mutex<TaskStore>> {
        Arc::clone(&self.store)
    }

    pub fn sync_handle(&self) -> SyncHandle {
        self.sync.clone()
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Execute one parsed command and return its feedback.
    pub fn execute(&mut self, cmd: crate::parse::ParsedCommand) -> Result<Feedback, CommandError> {
        use crate::parse::ParsedCommand::*;

        self.fold_completed_sync();

        // Commands that do not consult the resolver leave search mode.
        if matches!(cmd, Add(_) | Help | Settings(_) | Sync | Exit) {
            self.resolver.set_mode(ViewMode::Shown);
        }

        match cmd {
            Undo => self.undo(),
            Redo => self.redo(),
            Help => Ok(help_text()),
            Exit => {
                if self.sync.is_running() {
                    return Err(CommandError::SyncInProgress);
                }
                self.reap_sync_thread();
                Ok("bye".into())
            }
            Show(target) => {
                if let Some(kind) = target {
                    self.tab = kind;
                }
                self.resolver.set_mode(ViewMode::Shown);
                let store = Self::lock(&self.store);
                Ok(render_list(&store, self.tab))
            }
            Search(pattern) => self.search(&pattern),
            Settings(change) => self.settings_cmd(change),
            Sync => self.start_sync(),
            Add(args) => self.run_two_way(TwoWayCommand::Add(AddCommand::new(args)?)),
            Edit { row, patch } => {
                self.run_two_way(TwoWayCommand::Edit(EditCommand::new(row, patch)?))
            }
            Remove(rows) => self.run_two_way(TwoWayCommand::Remove(RemoveCommand::new(rows))),
            Complete(rows) => self.run_two_way(TwoWayCommand::Complete(CompleteCommand::new(rows))),
            Incomplete(rows) => {
                self.run_two_way(TwoWayCommand::Incomplete(IncompleteCommand::new(rows)))
            }
            Recover(rows) => self.run_two_way(TwoWayCommand::Recover(RecoverCommand::new(rows))),
            Mark(rows) => self.run_two_way(TwoWayCommand::Mark(MarkCommand::new(rows))),
            Unmark(rows) => self.run_two_way(TwoWayCommand::Unmark(UnmarkCommand::new(rows))),
            Clear => self.run_two_way(TwoWayCommand::ClearAll(ClearAllCommand::new())),
        }
    }

    /// Invert the most recent two-way command. Rejected while a sync pass
    /// is running — the pass may be rewriting the very state the undo
    /// snapshot refers to.
    pub fn undo(&mut self) -> Result<Feedback, CommandError> {
        self.fold_completed_sync();
        if self.sync.is_running() {
            return Err(CommandError::SyncInProgress);
        }
        let feedback = {
            let mut guard = Self::lock(&self.store);
            let mut ctx = ExecContext {
                store: &mut guard,
                resolver: &mut self.resolver,
                tab: self.tab,
                sync_running: false,
            };
            self.history.undo(&mut ctx)?
        };
        self.persist();
        Ok(feedback)
    }

    /// Repeat the most recently undone command. Same sync guard as undo.
    pub fn redo(&mut self) -> Result<Feedback, CommandError> {
        self.fold_completed_sync();
        if self.sync.is_running() {
            return Err(CommandError::SyncInProgress);
        }
        let feedback = {
            let mut guard = Self::lock(&self.store);
            let mut ctx = ExecContext {
                store: &mut guard,
                resolver: &mut self.resolver,
                tab: self.tab,
                sync_running: false,
            };
            self.history.redo(&mut ctx)?
        };
        self.persist();
        Ok(feedback)
    }

    // -----------------------------------------------------------------------
    // Two-way execution
    // -----------------------------------------------------------------------

    fn run_two_way(&mut self, mut command: TwoWayCommand) -> Result<Feedback, CommandError> {
        let mode_at_execution = self.resolver.mode();
        let sync_running = self.sync.is_running();
        let feedback = {
            let mut guard = Self::lock(&self.store);
            let mut ctx = ExecContext {
                store: &mut guard,
                resolver: &mut self.resolver,
                tab: self.tab,
                sync_running,
            };
            command.execute(&mut ctx)?
        };
        // History only learns about commands that succeeded.
        self.history.record(command, mode_at_execution);
        self.persist();
        Ok(feedback)
    }

    // -----------------------------------------------------------------------
    // One-shot commands
    // -----------------------------------------------------------------------

    fn search(&mut self, pattern: &str) -> Result<Feedback, CommandError> {
        // An invalid regex is treated as literal text, not an error.
        let re = Regex::new(&format!("(?i){}", pattern))
            .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
            .map_err(|_| CommandError::Settings("unusable search pattern".into()))?;

        let mut guard = Self::lock(&self.store);
        let hits: Vec<Vec<u64>> = ListKind::all()
            .into_iter()
            .map(|kind| {
                guard
                    .list(kind)
                    .iter()
                    .filter(|t| re.is_match(&t.text) || re.is_match(&t.tag.label))
                    .map(|t| t.uid)
                    .collect()
            })
            .collect();
        let counts: Vec<usize> = hits.iter().map(Vec::len).collect();
        let total: usize = counts.iter().sum();

        let [pending, completed, trash] = <[Vec<u64>; 3]>::try_from(hits).unwrap_or_default();
        if total == 0 {
            guard.clear_search_views();
            drop(guard);
            self.resolver.set_mode(ViewMode::Shown);
            return Ok(format!("No matches for \"{}\"", pattern));
        }
        guard.set_search_views(pending, completed, trash);
        drop(guard);
        self.resolver.set_mode(ViewMode::Searched);

        let guard = Self::lock(&self.store);
        let mut feedback = format!(
            "{} match{} ({} pending, {} completed, {} trash)",
            total,
            if total == 1 { "" } else { "es" },
            counts[0],
            counts[1],
            counts[2]
        );
        let listing = render_search(&guard, self.tab);
        if !listing.is_empty() {
            feedback.push('\n');
            feedback.push_str(&listing);
        }
        Ok(feedback)
    }

    fn settings_cmd(
        &mut self,
        change: Option<(String, String)>,
    ) -> Result<Feedback, CommandError> {
        match change {
            None => {
                let feed = self
                    .settings
                    .sync_feed
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(unset)".into());
                Ok(format!(
                    "sync.feed = {}\nhistory.limit = {}",
                    feed, self.settings.history_limit
                ))
            }
            Some((key, value)) => {
                if let Some(path) = &self.settings_path {
                    settings::set_key(path, &key, &value)
                        .map_err(|e| CommandError::Settings(e.to_string()))?;
                    self.settings = settings::load(path)
                        .map_err(|e| CommandError::Settings(e.to_string()))?;
                } else {
                    // In-memory run: apply without a file behind it.
                    match key.as_str() {
                        "sync.feed" => self.settings.sync_feed = Some(PathBuf::from(&value)),
                        "history.limit" => {
                            self.settings.history_limit =
                                value.parse().map_err(|_| {
                                    CommandError::Settings(format!(
                                        "invalid value for {}: {}",
                                        key, value
                                    ))
                                })?;
                        }
                        other => {
                            return Err(CommandError::Settings(format!(
                                "unknown setting: {}",
                                other
                            )));
                        }
                    }
                }
                self.history.set_limit(self.settings.history_limit);
                Ok(format!("{} = {}", key, value))
            }
        }
    }

    fn start_sync(&mut self) -> Result<Feedback, CommandError> {
        if self.sync.is_running() {
            return Err(CommandError::SyncInProgress);
        }
        let Some(feed) = self.settings.sync_feed.clone() else {
            return Err(CommandError::SyncNotConfigured);
        };
        self.reap_sync_thread();
        info!("starting sync pass against {}", feed.display());
        let provider = Box::new(FeedProvider::new(feed));
        let handle = spawn_pass(provider, Arc::clone(&self.store), self.sync.clone());
        self.sync_thread = Some(handle);
        Ok("Sync started".into())
    }

    // -----------------------------------------------------------------------
    // Sync bookkeeping
    // -----------------------------------------------------------------------

    /// A finished pass may have inserted or deleted tasks out-of-band, so
    /// every recorded snapshot is suspect: drop the whole history.
    fn fold_completed_sync(&mut self) {
        let passes = self.sync.completed_passes();
        if passes > self.seen_passes {
            self.seen_passes = passes;
            if self.history.can_undo() || self.history.can_redo() {
                info!("sync pass completed; dropping undo history");
            }
            self.history.clear();
            self.reap_sync_thread();
            self.persist();
        }
    }

    fn reap_sync_thread(&mut self) {
        if !self.sync.is_running()
            && let Some(handle) = self.sync_thread.take()
        {
            let _ = handle.join();
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Lock the store. Borrows only the store field, so the resolver and
    /// history stay free for the execution context.
    fn lock(store: &Mutex<TaskStore>) -> MutexGuard<'_, TaskStore> {
        store.lock().expect("task store lock poisoned")
    }

    /// Write the snapshot. Failure is logged, never fatal: the in-memory
    /// state stays authoritative.
    fn persist(&self) {
        let Some(path) = &self.data_path else {
            return;
        };
        let guard = Self::lock(&self.store);
        if let Err(e) = storage::save(path, &guard) {
            warn!("could not persist tasks: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn format_row(row: usize, task: &Task) -> String {
    let mut line = format!("{:>3}. ", row);
    if task.important {
        line.push_str("[!] ");
    }
    line.push_str(&task.text);
    if !task.tag.label.is_empty() {
        line.push_str(&format!("  #{}", task.tag.label));
    }
    match (task.start, task.end) {
        (Some(start), Some(end)) => {
            line.push_str(&format!(
                "  ({} - {})",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ));
        }
        (None, Some(end)) => {
            line.push_str(&format!("  (due {})", end.format("%Y-%m-%d %H:%M")));
        }
        (Some(start), None) => {
            line.push_str(&format!("  (from {})", start.format("%Y-%m-%d %H:%M")));
        }
        (None, None) => {}
    }
    if task.num_occurrences > 0 {
        line.push_str(&format!(
            "  [{}/{}]",
            task.current_occurrence, task.num_occurrences
        ));
    }
    line
}

fn render_list(store: &TaskStore, tab: ListKind) -> String {
    let tasks = store.list(tab);
    if tasks.is_empty() {
        return format!("{} is empty", tab.name());
    }
    let mut out = format!("{} ({}):", tab.name(), tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        out.push('\n');
        out.push_str(&format_row(i + 1, task));
    }
    out
}

fn render_search(store: &TaskStore, tab: ListKind) -> String {
    let mut out = String::new();
    for (i, &uid) in store.search_view(tab).iter().enumerate() {
        let Some(slot) = store.position_of(tab, uid) else {
            continue;
        };
        let Some(task) = store.task(tab, slot) else {
            continue;
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format_row(i + 1, task));
    }
    out
}

fn help_text() -> String {
    "\
commands:
  add <text> [/from <date>] [/to <date>] [/tag <label>] [/every <period> xN] [/important]
  edit <row> [<new text>] [/from|/to|/tag|/every|/important|/plain]
  remove | complete | incomplete | recover | mark | unmark <rows>   (e.g. 2 4-6)
  clear                 empty the current list (honors an active search)
  show [pending|completed|trash]
  search <pattern>
  settings [<key> <value>]
  sync | undo | redo | help | exit"
        .to_string()
}
