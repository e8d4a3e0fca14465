//! Error types for population and queries

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Person folder name isn't in a correct form - Person_X or Person X, where X - id - folder's name is - {0}")]
    InvalidPersonFolder(String),

    #[error("Person's hand folder - {0} - doesn't start with 'R' or 'L', aborting operation")]
    InvalidHandFolder(String),

    #[error("A file with model id {0} already exists. Possibly the database already exists; re-run `bwdb create --recreate`")]
    AlreadyPopulated(String),

    #[error("Doubling {count} database {scope} files, aborting building database protocols")]
    DuplicateEntries { scope: &'static str, count: usize },

    #[error("File list entry '{0}' does not correspond to any database file, aborting building database protocols")]
    UnknownFile(String),

    #[error("Multiple files correspond to the file list entry '{0}', aborting building database protocols")]
    AmbiguousFile(String),

    #[error(transparent)]
    InvalidParameter(#[from] biowave_db::ParseChoiceError),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatabaseError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        DatabaseError::Storage(e.into())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
