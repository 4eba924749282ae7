use crate::knowledge::KnowledgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error(transparent)]
    Source(#[from] KnowledgeError),
    #[error("Malformed rows (fewer than 2 fields) at lines {0:?}")]
    MalformedRows(Vec<u64>),
    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: &'static str,
        source: serde_yaml_ng::Error,
    },
    #[error("Could not remove or move aside {}: {reason}", path.display())]
    DirectoryLocked { path: PathBuf, reason: String },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
