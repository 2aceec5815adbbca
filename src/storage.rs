use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::models::{DailyLog, Task, UserProfile};

/// Profile persistence with an optimistic concurrency check.
pub trait ProfileStore {
    /// Loads a profile. Fails with [`StoreError::ProfileNotFound`] when absent.
    fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError>;

    /// Writes `profile` if the stored version still equals `profile.version`.
    ///
    /// Returns the stored profile with its bumped version.
    fn put_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError>;
}

pub trait TaskStore {
    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;
    fn save_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<(), StoreError>;
}

/// Selects logs by date range; `limit` keeps the most recent entries.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl LogFilter {
    pub fn on(date: NaiveDate) -> LogFilter {
        LogFilter { since: Some(date), until: Some(date), limit: None }
    }

    fn matches(&self, log: &DailyLog) -> bool {
        self.since.map_or(true, |d| log.date >= d) && self.until.map_or(true, |d| log.date <= d)
    }
}

pub trait LogStore {
    /// Appends a log, rejecting a second log for the same date.
    fn append_log(&self, user_id: &str, log: &DailyLog) -> Result<(), StoreError>;

    /// Withdraws the log of `date`, if any.
    fn remove_log(&self, user_id: &str, date: NaiveDate) -> Result<(), StoreError>;

    /// Logs matching `filter`, oldest first.
    fn list_logs(&self, user_id: &str, filter: &LogFilter) -> Result<Vec<DailyLog>, StoreError>;
}

/// Everything the ledger needs from persistence.
pub trait Store: ProfileStore + TaskStore + LogStore {}

impl<T: ProfileStore + TaskStore + LogStore> Store for T {}

/// JSON files under `<root>/<user_id>/`: `profile.json`, `tasks.json`, `logs.json`.
///
/// Each file is replaced atomically by writing a sibling `.tmp` file and
/// renaming it. The version and per-date checks read the file before the
/// rename without a lock, so they only hold for a single writer process;
/// concurrent processes on one account can still both pass a check.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> JsonStore {
        JsonStore { root: root.into() }
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !user_id.is_empty()
            && !user_id.starts_with('.')
            && user_id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'));
        if !valid {
            return Err(StoreError::InvalidUserId(user_id.to_string()));
        }
        let mut p = self.root.clone();
        p.push(user_id);
        Ok(p)
    }

    fn file(&self, user_id: &str, name: &str) -> Result<PathBuf, StoreError> {
        let mut p = self.user_dir(user_id)?;
        p.push(name);
        Ok(p)
    }

    pub fn has_profile(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.file(user_id, "profile.json")?.exists())
    }

    /// Removes all data belonging to `user_id`.
    pub fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        let dir = self.user_dir(user_id)?;
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
    let mut f = OpenOptions::new().read(true).open(path).map_err(io_err)?;
    let mut s = String::new();
    f.read_to_string(&mut s).map_err(io_err)?;
    serde_json::from_str(&s)
        .map(Some)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let s = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    let tmp = path.with_extension("json.tmp");
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .map_err(io_err)?;
    f.write_all(s.as_bytes()).map_err(io_err)?;
    f.sync_all().map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

impl ProfileStore for JsonStore {
    fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        read_json(&self.file(user_id, "profile.json")?)?
            .ok_or_else(|| StoreError::ProfileNotFound(user_id.to_string()))
    }

    fn put_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let path = self.file(&profile.user_id, "profile.json")?;
        let found = read_json::<UserProfile>(&path)?.map_or(0, |p| p.version);
        if found != profile.version {
            return Err(StoreError::VersionConflict {
                user_id: profile.user_id.clone(),
                expected: profile.version,
                found,
            });
        }
        let stored = UserProfile { version: profile.version + 1, ..profile.clone() };
        write_json(&path, &stored)?;
        debug!("stored profile {} v{}", stored.user_id, stored.version);
        Ok(stored)
    }
}

impl TaskStore for JsonStore {
    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        Ok(read_json(&self.file(user_id, "tasks.json")?)?.unwrap_or_default())
    }

    fn save_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<(), StoreError> {
        write_json(&self.file(user_id, "tasks.json")?, tasks)
    }
}

impl LogStore for JsonStore {
    fn append_log(&self, user_id: &str, log: &DailyLog) -> Result<(), StoreError> {
        let path = self.file(user_id, "logs.json")?;
        let mut logs: Vec<DailyLog> = read_json(&path)?.unwrap_or_default();
        if logs.iter().any(|l| l.date == log.date) {
            return Err(StoreError::DuplicateLog { user_id: user_id.to_string(), date: log.date });
        }
        logs.push(log.clone());
        logs.sort_by_key(|l| l.date);
        write_json(&path, &logs)
    }

    fn remove_log(&self, user_id: &str, date: NaiveDate) -> Result<(), StoreError> {
        let path = self.file(user_id, "logs.json")?;
        let mut logs: Vec<DailyLog> = read_json(&path)?.unwrap_or_default();
        let before = logs.len();
        logs.retain(|l| l.date != date);
        if logs.len() != before {
            write_json(&path, &logs)?;
        }
        Ok(())
    }

    fn list_logs(&self, user_id: &str, filter: &LogFilter) -> Result<Vec<DailyLog>, StoreError> {
        let mut logs: Vec<DailyLog> = read_json::<Vec<DailyLog>>(&self.file(user_id, "logs.json")?)?
            .unwrap_or_default()
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect();
        logs.sort_by_key(|l| l.date);
        if let Some(limit) = filter.limit {
            let skip = logs.len().saturating_sub(limit);
            logs.drain(..skip);
        }
        Ok(logs)
    }
}
