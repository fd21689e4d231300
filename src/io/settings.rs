use std::path::{Path, PathBuf};

use crate::io::storage::atomic_write;

/// Error type for the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unknown setting: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    BadValue { key: String, value: String },
}

/// User-tunable knobs, read from `settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Exchange file the sync pass reads and writes. Sync is disabled
    /// until this is set.
    pub sync_feed: Option<PathBuf>,
    /// Undo stack bound.
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sync_feed: None,
            history_limit: 500,
        }
    }
}

/// Read the settings file. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc: toml_edit::DocumentMut = text
        .parse()
        .map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut settings = Settings::default();
    if let Some(feed) = doc
        .get("sync")
        .and_then(|s| s.get("feed"))
        .and_then(|v| v.as_str())
    {
        settings.sync_feed = Some(PathBuf::from(feed));
    }
    if let Some(limit) = doc
        .get("history")
        .and_then(|h| h.get("limit"))
        .and_then(|v| v.as_integer())
    {
        settings.history_limit = limit.max(1) as usize;
    }
    Ok(settings)
}

/// Set one key, preserving the file's formatting and comments.
pub fn set_key(path: &Path, key: &str, value: &str) -> Result<(), SettingsError> {
    let text = if path.exists() {
        std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        String::new()
    };
    let mut doc: toml_edit::DocumentMut = text
        .parse()
        .map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    match key {
        "sync.feed" => {
            if !doc.contains_key("sync") {
                doc["sync"] = toml_edit::Item::Table(toml_edit::Table::new());
            }
            doc["sync"]["feed"] = toml_edit::value(value);
        }
        "history.limit" => {
            let limit: i64 = value.parse().map_err(|_| SettingsError::BadValue {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            if limit < 1 {
                return Err(SettingsError::BadValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
            if !doc.contains_key("history") {
                doc["history"] = toml_edit::Item::Table(toml_edit::Table::new());
            }
            doc["history"]["limit"] = toml_edit::value(limit);
        }
        other => return Err(SettingsError::UnknownKey(other.to_string())),
    }

    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| SettingsError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load(&tmp.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn set_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        set_key(&path, "sync.feed", "/tmp/feed.json").unwrap();
        set_key(&path, "history.limit", "50").unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.sync_feed, Some(PathBuf::from("/tmp/feed.json")));
        assert_eq!(settings.history_limit, 50);
    }

    #[test]
    fn edits_preserve_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        std::fs::write(
            &path,
            "# my settings\n\n[history]\n# keep it small\nlimit = 10\n",
        )
        .unwrap();

        set_key(&path, "history.limit", "20").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# my settings"));
        assert!(text.contains("# keep it small"));
        assert!(text.contains("limit = 20"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        assert!(matches!(
            set_key(&path, "colors.theme", "dark").unwrap_err(),
            SettingsError::UnknownKey(_)
        ));
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        assert!(matches!(
            set_key(&path, "history.limit", "lots").unwrap_err(),
            SettingsError::BadValue { .. }
        ));
    }
}
