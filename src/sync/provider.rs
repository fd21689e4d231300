use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::io::storage::atomic_write;
use crate::sync::SyncError;

/// A task as the sync source sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    /// Identifier assigned by the source. Empty on an outbound addition
    /// that has not been acknowledged yet.
    pub id: String,
    pub text: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// The transport behind a sync pass. `fetch` pulls the source's current
/// task list; `push` reports local additions and deletions and returns the
/// ids the source assigned to the additions, in order.
///
/// Both calls may block; neither is invoked while the store lock is held.
pub trait SyncProvider: Send {
    fn fetch(&mut self) -> Result<Vec<RemoteTask>, SyncError>;

    fn push(
        &mut self,
        additions: &[RemoteTask],
        deletions: &[String],
    ) -> Result<Vec<String>, SyncError>;
}

/// A provider backed by a JSON exchange file — the feed another calendar
/// application reads and writes. A missing file is an empty feed.
#[derive(Debug)]
pub struct FeedProvider {
    path: PathBuf,
}

impl FeedProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FeedProvider { path: path.into() }
    }

    fn read_feed(&self) -> Result<Vec<RemoteTask>, SyncError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| SyncError::Provider(format!("read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| SyncError::Provider(format!("parse {}: {}", self.path.display(), e)))
    }

    fn write_feed(&self, feed: &[RemoteTask]) -> Result<(), SyncError> {
        let text = serde_json::to_string_pretty(feed)
            .map_err(|e| SyncError::Provider(e.to_string()))?;
        atomic_write(&self.path, text.as_bytes())
            .map_err(|e| SyncError::Provider(format!("write {}: {}", self.path.display(), e)))
    }

    fn next_id(feed: &[RemoteTask]) -> u64 {
        feed.iter()
            .filter_map(|r| r.id.strip_prefix("feed-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl SyncProvider for FeedProvider {
    fn fetch(&mut self) -> Result<Vec<RemoteTask>, SyncError> {
        self.read_feed()
    }

    fn push(
        &mut self,
        additions: &[RemoteTask],
        deletions: &[String],
    ) -> Result<Vec<String>, SyncError> {
        let mut feed = self.read_feed()?;
        feed.retain(|r| !deletions.contains(&r.id));

        let mut next = Self::next_id(&feed);
        let mut assigned = Vec::with_capacity(additions.len());
        for addition in additions {
            let id = format!("feed-{}", next);
            next += 1;
            feed.push(RemoteTask {
                id: id.clone(),
                ..addition.clone()
            });
            assigned.push(id);
        }

        self.write_feed(&feed)?;
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task(id: &str, text: &str) -> RemoteTask {
        RemoteTask {
            id: id.into(),
            text: text.into(),
            start: None,
            end: None,
        }
    }

    #[test]
    fn missing_feed_is_empty() {
        let tmp = TempDir::new().unwrap();
        let mut provider = FeedProvider::new(tmp.path().join("feed.json"));
        assert!(provider.fetch().unwrap().is_empty());
    }

    #[test]
    fn push_assigns_sequential_ids_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let mut provider = FeedProvider::new(tmp.path().join("feed.json"));

        let assigned = provider
            .push(&[task("", "one"), task("", "two")], &[])
            .unwrap();
        assert_eq!(assigned, ["feed-1", "feed-2"]);

        let feed = provider.fetch().unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, "feed-1");
        assert_eq!(feed[1].text, "two");
    }

    #[test]
    fn push_applies_deletions() {
        let tmp = TempDir::new().unwrap();
        let mut provider = FeedProvider::new(tmp.path().join("feed.json"));
        provider.push(&[task("", "one"), task("", "two")], &[]).unwrap();

        provider.push(&[], &["feed-1".to_string()]).unwrap();
        let feed = provider.fetch().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "two");
    }

    #[test]
    fn ids_continue_past_the_highest_survivor() {
        let tmp = TempDir::new().unwrap();
        let mut provider = FeedProvider::new(tmp.path().join("feed.json"));
        provider.push(&[task("", "one"), task("", "two")], &[]).unwrap();
        provider.push(&[], &["feed-1".to_string()]).unwrap();
        let assigned = provider.push(&[task("", "three")], &[]).unwrap();
        assert_eq!(assigned, ["feed-3"]);
    }
}
