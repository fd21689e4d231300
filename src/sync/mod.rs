//! The background synchronization pass.
//!
//! A pass runs in three phases — fetch, reconcile, push — with a commit step
//! at the end. Only fetch and push may block (provider I/O), and the store
//! lock is never held across them. Cancellation is honored between phases,
//! never mid-phase. Foreground commands that run while a pass is active use
//! the sync-running column of the lifecycle transition table; no other
//! coordination is needed.

pub mod provider;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{info, warn};

use crate::model::{ListKind, Task, TaskStatus, TaskStore};

pub use provider::{FeedProvider, RemoteTask, SyncProvider};

/// Sync failures. A failed pass leaves the collections untouched apart from
/// whatever the provider already acknowledged; the provisional status flags
/// stay set so the next pass picks the same work up again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("a sync pass is already running")]
    AlreadyRunning,
    #[error("sync pass cancelled")]
    Cancelled,
    #[error("sync provider error: {0}")]
    Provider(String),
}

/// Shared flags between the foreground and the pass thread. The foreground
/// polls `completed_passes` to learn that a pass finished and its history
/// must be dropped.
#[derive(Debug, Clone, Default)]
pub struct SyncHandle {
    inner: Arc<SyncFlags>,
}

#[derive(Debug, Default)]
struct SyncFlags {
    running: AtomicBool,
    cancel: AtomicBool,
    completed_passes: AtomicU64,
}

impl SyncHandle {
    pub fn new() -> Self {
        SyncHandle::default()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Ask a running pass to stop at its next phase boundary.
    pub fn request_cancel(&self) {
        self.inner.cancel.store(true, Ordering::SeqCst);
    }

    pub fn completed_passes(&self) -> u64 {
        self.inner.completed_passes.load(Ordering::SeqCst)
    }

    fn begin(&self) -> bool {
        self.inner.cancel.store(false, Ordering::SeqCst);
        self.inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn finish(&self, success: bool) {
        if success {
            self.inner.completed_passes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.running.store(false, Ordering::SeqCst);
    }

    fn cancelled(&self) -> bool {
        self.inner.cancel.load(Ordering::SeqCst)
    }
}

/// What a completed pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Remote tasks imported locally.
    pub imported: usize,
    /// Local additions reported to the provider.
    pub pushed: usize,
    /// Local deletions reported to the provider.
    pub deleted: usize,
    /// Local tasks dropped because the remote no longer has them.
    pub dropped: usize,
}

/// Outbound work collected during reconcile.
struct Outbound {
    additions: Vec<RemoteTask>,
    addition_uids: Vec<u64>,
    deletions: Vec<String>,
}

/// Run one full pass on the calling thread.
pub fn run_pass(
    provider: &mut dyn SyncProvider,
    store: &Mutex<TaskStore>,
    handle: &SyncHandle,
) -> Result<SyncReport, SyncError> {
    if !handle.begin() {
        return Err(SyncError::AlreadyRunning);
    }
    let result = run_phases(provider, store, handle);
    handle.finish(result.is_ok());
    match &result {
        Ok(report) => info!(
            "sync pass complete: {} imported, {} pushed, {} deleted, {} dropped",
            report.imported, report.pushed, report.deleted, report.dropped
        ),
        Err(e) => warn!("sync pass failed: {}", e),
    }
    result
}

/// Run a pass on a background thread. The handle's flags report progress;
/// the result itself is logged.
pub fn spawn_pass(
    mut provider: Box<dyn SyncProvider>,
    store: Arc<Mutex<TaskStore>>,
    handle: SyncHandle,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let _ = run_pass(provider.as_mut(), &store, &handle);
    })
}

fn run_phases(
    provider: &mut dyn SyncProvider,
    store: &Mutex<TaskStore>,
    handle: &SyncHandle,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    // Phase 1: fetch. No lock held.
    let remote = provider.fetch()?;
    if handle.cancelled() {
        return Err(SyncError::Cancelled);
    }

    // Phase 2: reconcile, under the store lock.
    let outbound = {
        let mut store = store.lock().expect("task store lock poisoned");
        reconcile(&mut store, &remote, &mut report)
    };
    if handle.cancelled() {
        return Err(SyncError::Cancelled);
    }

    // Phase 3: push. No lock held; the WhenSync flags cover anything the
    // foreground does meanwhile.
    let assigned = provider.push(&outbound.additions, &outbound.deletions)?;

    // Commit: record assigned ids and collapse the provisional flags.
    {
        let mut store = store.lock().expect("task store lock poisoned");
        commit(&mut store, &outbound, &assigned);
    }
    report.pushed = outbound.additions.len();
    report.deleted = outbound.deletions.len();
    Ok(report)
}

/// Import unknown remote tasks and collect outbound changes.
fn reconcile(store: &mut TaskStore, remote: &[RemoteTask], report: &mut SyncReport) -> Outbound {
    let remote_ids: Vec<&str> = remote.iter().map(|r| r.id.as_str()).collect();

    // Import remote tasks we have never seen.
    for r in remote {
        let known = ListKind::all().into_iter().any(|kind| {
            store
                .list(kind)
                .iter()
                .any(|t| !t.sync_id.is_empty() && t.sync_id == r.id)
        });
        if !known {
            let mut task = Task::new(r.text.clone());
            task.start = r.start;
            task.end = r.end;
            task.sync_id = r.id.clone();
            task.status = TaskStatus::Unchanged;
            store.insert(ListKind::Pending, task);
            report.imported += 1;
        }
    }

    // Drop live tasks the remote deleted out-of-band.
    for kind in [ListKind::Pending, ListKind::Completed] {
        let gone: Vec<u64> = store
            .list(kind)
            .iter()
            .filter(|t| {
                !t.sync_id.is_empty()
                    && t.status == TaskStatus::Unchanged
                    && !remote_ids.contains(&t.sync_id.as_str())
            })
            .map(|t| t.uid)
            .collect();
        for uid in gone {
            store.remove_uid(kind, uid);
            report.dropped += 1;
        }
    }

    // Collect local work to report: new tasks, and trashed tasks the remote
    // still has.
    let mut additions = Vec::new();
    let mut addition_uids = Vec::new();
    for kind in [ListKind::Pending, ListKind::Completed] {
        for t in store.list(kind) {
            if t.status == TaskStatus::NewlyAdded {
                additions.push(RemoteTask {
                    id: String::new(),
                    text: t.text.clone(),
                    start: t.start,
                    end: t.end,
                });
                addition_uids.push(t.uid);
            }
        }
    }
    let deletions: Vec<String> = store
        .list(ListKind::Trash)
        .iter()
        .filter(|t| t.status == TaskStatus::Deleted && !t.sync_id.is_empty())
        .map(|t| t.sync_id.clone())
        .collect();

    Outbound {
        additions,
        addition_uids,
        deletions,
    }
}

/// Apply the provider's acknowledgements and collapse provisional flags.
fn commit(store: &mut TaskStore, outbound: &Outbound, assigned: &[String]) {
    for (&uid, id) in outbound.addition_uids.iter().zip(assigned) {
        if let Some((kind, slot)) = store.find_uid(uid)
            && let Some(task) = store.task_mut(kind, slot)
        {
            task.sync_id = id.clone();
            task.status = TaskStatus::Unchanged;
        }
    }
    // Propagated deletions no longer need remembering.
    for task in store.all_tasks_mut() {
        if task.status == TaskStatus::Deleted && outbound.deletions.contains(&task.sync_id) {
            task.status = TaskStatus::Unchanged;
        }
    }
    for task in store.all_tasks_mut() {
        task.status = task.status.clear_sync_info();
    }
}
