//! Enumerate the snapshots of a copy-on-write volume and work out which one
//! the running system booted from.
//!
//! The portable core talks to the platform through two seams:
//! [`AttributeSource`] pages packed attribute records out of a volume, and
//! [`DeviceTree`] reads typed properties from the firmware device tree. The
//! macOS implementations of both live in [`sys`].

pub mod attr;
mod boot_hash;
pub mod encoding;
mod error;
mod snapshot;

#[cfg(target_os = "macos")]
pub mod sys;

pub use attr::{AttrRecord, AttributeSource, CommonAttr, MAXPATHLEN};
pub use boot_hash::{
    resolve_boot_hash, system_snapshot_with, BootHash, DeviceTree, PropertyValue, RegistryEntry,
    BOOT_MANIFEST_HASH, CHOSEN_PATH, ROOT_SNAPSHOT_NAME, SNAPSHOT_PREFIX,
};
pub use error::{Error, Result};
pub use snapshot::{
    first_snapshot, has_snapshot, list_snapshots, ListOptions, SnapshotList, SnapshotName,
    DEFAULT_MAX_SNAPSHOTS,
};

#[cfg(target_os = "macos")]
pub use sys::{system_snapshot, Volume};
