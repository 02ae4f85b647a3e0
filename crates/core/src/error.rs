use crate::models::RecordKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("a {kind} with id '{id}' already exists")]
    DuplicateId { kind: RecordKind, id: String },
    #[error("{kind} '{id}' not found")]
    ReferenceNotFound { kind: RecordKind, id: String },
    #[error("failed to create data directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write data file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize records: {0}")]
    Serialization(serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Why the last load of a data file produced an empty collection.
///
/// Load failures never reach callers as errors; a store keeps the most recent one so that
/// "unreadable" can still be told apart from "legitimately empty".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read data file: {0}")]
    FileRead(String),
    #[error("failed to deserialize records: {0}")]
    Deserialization(String),
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),
}
