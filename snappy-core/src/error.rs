use std::collections::TryReserveError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot allocate memory for snapshot names")]
    Allocation(#[from] TryReserveError),

    #[error("Cannot page snapshot attributes")]
    Paging(#[source] std::io::Error),

    #[error("Malformed attribute record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: &'static str },

    #[error("Cannot get device tree entry `{path}`")]
    EntryUnavailable { path: String },

    #[error("Unable to read neither root-snapshot-name nor boot-manifest-hash")]
    MissingProperty,

    #[error("Property `{key}` is not data (found {found})")]
    TypeMismatch { key: &'static str, found: String },

    #[error("Root snapshot name is not valid UTF-8")]
    InvalidSnapshotName(#[source] std::str::Utf8Error),

    #[error("Hex buffer too small: need {needed} bytes, have {available}")]
    EncodingBufferTooSmall { needed: usize, available: usize },
}
