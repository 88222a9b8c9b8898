use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub enum Error {
    #[error("Cannot open volume `{}`", .path.display())]
    OpenVolume {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot list snapshots on `{}`", .path.display())]
    ListSnapshots {
        path: PathBuf,
        #[source]
        source: snappy_core::Error,
    },

    #[error("Snapshot `{name}` not found on `{}`", .path.display())]
    SnapshotNotFound { path: PathBuf, name: String },

    #[error("No snapshots found on `{}`", .path.display())]
    NoSnapshots { path: PathBuf },

    #[error("Cannot resolve the system snapshot")]
    SystemSnapshot {
        #[source]
        source: snappy_core::Error,
    },

    #[error("Snapshots can only be inspected on macOS")]
    UnsupportedPlatform,
}
