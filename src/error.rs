use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the profile, task and log stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no profile for user '{0}'")]
    ProfileNotFound(String),

    #[error("profile for '{user_id}' changed concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        user_id: String,
        expected: u64,
        found: u64,
    },

    #[error("a log for {date} already exists for user '{user_id}'")]
    DuplicateLog { user_id: String, date: NaiveDate },

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or unknown token")]
    InvalidToken,

    #[error("this action needs the parent password")]
    ParentPasswordRequired,

    #[error("wrong parent password")]
    WrongParentPassword,

    #[error("parent password must be at least {0} characters")]
    WeakParentPassword(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors surfaced by ledger operations and commands.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} has already been settled")]
    AlreadySettled(NaiveDate),

    #[error("no tasks are scheduled on {0}; nothing to settle")]
    NoTasksScheduled(NaiveDate),

    #[error("balance would overflow")]
    BalanceOverflow,

    #[error("gave up after {0} concurrent profile updates")]
    ConflictRetriesExhausted(u32),

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
