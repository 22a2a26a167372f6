pub mod coords;
pub mod storage;

use thiserror::Error;

pub use coords::{
    CoordinateParser, ParseReport, ParserOptions, RejectedLine, format_line, parse_batch,
    parse_line,
};
pub use storage::{
    FileStore, FolderRepository, KeyValueStore, LoadOutcome, MemoryStore, STORAGE_KEY,
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("failed to serialize folder tree: {0}")]
    Serialize(#[source] serde_json::Error),
}
