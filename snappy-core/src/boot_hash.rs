//! Resolving which snapshot the running system booted from.
//!
//! Firmware records this in the device tree's `chosen` node in one of two
//! ways: newer systems publish the snapshot name itself, older ones publish
//! the boot manifest digest, from which the snapshot name is derived.

use std::fmt;

use crate::{encoding, Error, Result};

pub const CHOSEN_PATH: &str = "IODeviceTree:/chosen";
pub const ROOT_SNAPSHOT_NAME: &str = "root-snapshot-name";
pub const BOOT_MANIFEST_HASH: &str = "boot-manifest-hash";

/// Prefix of snapshots named after a boot manifest digest.
pub const SNAPSHOT_PREFIX: &str = "com.apple.os.update-";

const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// A typed property value read from a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Data(Vec<u8>),
    /// Anything that is not a data blob, identified by its type id.
    Other { type_id: u64 },
}

impl PropertyValue {
    fn into_data(self) -> std::result::Result<Vec<u8>, String> {
        match self {
            PropertyValue::Data(data) => Ok(data),
            PropertyValue::Other { type_id } => Err(format!("type id {}", type_id)),
        }
    }
}

/// An entry in the device tree. Dropping it releases the entry.
pub trait RegistryEntry {
    fn property(&self, key: &str) -> Option<PropertyValue>;
}

pub trait DeviceTree {
    type Entry: RegistryEntry;

    /// Look up the entry at `path`, or `None` if no valid entry exists there.
    fn entry(&self, path: &str) -> Option<Self::Entry>;
}

impl<T: DeviceTree + ?Sized> DeviceTree for &T {
    type Entry = T::Entry;

    fn entry(&self, path: &str) -> Option<Self::Entry> {
        (**self).entry(path)
    }
}

/// What the device tree says the system booted from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BootHash {
    /// `root-snapshot-name`: the snapshot name itself.
    RootSnapshotName(String),
    /// `boot-manifest-hash`: the raw manifest digest.
    ManifestHash(Vec<u8>),
}

impl BootHash {
    /// The boot identifier: the snapshot name as-is, or the digest as
    /// uppercase hex.
    pub fn identifier(&self) -> String {
        match self {
            BootHash::RootSnapshotName(name) => name.clone(),
            BootHash::ManifestHash(digest) => encoding::encode_upper(digest),
        }
    }

    /// The name of the snapshot the system booted from.
    pub fn snapshot_name(&self) -> String {
        match self {
            BootHash::RootSnapshotName(name) => name.clone(),
            BootHash::ManifestHash(digest) => {
                format!("{}{}", SNAPSHOT_PREFIX, encoding::encode_upper(digest))
            }
        }
    }

    #[inline(always)]
    pub fn is_manifest_hash(&self) -> bool {
        matches!(self, BootHash::ManifestHash(_))
    }
}

impl fmt::Display for BootHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot_name())
    }
}

/// Read the boot identifying property from the `chosen` node.
///
/// `root-snapshot-name` wins when present; `boot-manifest-hash` is only
/// consulted without it. Either must be a data blob.
pub fn resolve_boot_hash<T: DeviceTree + ?Sized>(tree: &T) -> Result<BootHash> {
    let chosen = tree
        .entry(CHOSEN_PATH)
        .ok_or_else(|| Error::EntryUnavailable {
            path: CHOSEN_PATH.to_string(),
        })?;

    let property = match chosen.property(ROOT_SNAPSHOT_NAME) {
        Some(value) => Some((ROOT_SNAPSHOT_NAME, value)),
        None => chosen
            .property(BOOT_MANIFEST_HASH)
            .map(|value| (BOOT_MANIFEST_HASH, value)),
    };
    drop(chosen);

    let (key, value) = property.ok_or(Error::MissingProperty)?;
    tracing::debug!(key, "found boot property");

    let data = value
        .into_data()
        .map_err(|found| Error::TypeMismatch { key, found })?;

    if key == ROOT_SNAPSHOT_NAME {
        decode_snapshot_name(&data).map(BootHash::RootSnapshotName)
    } else {
        Ok(BootHash::ManifestHash(data))
    }
}

/// The name of the snapshot the running system booted from.
pub fn system_snapshot_with<T: DeviceTree + ?Sized>(tree: &T) -> Result<String> {
    resolve_boot_hash(tree).map(|hash| hash.snapshot_name())
}

/// Decode the UTF-8 external representation of a string property: an optional
/// byte order mark, then text up to the first NUL.
fn decode_snapshot_name(data: &[u8]) -> Result<String> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());

    std::str::from_utf8(&data[..end])
        .map(str::to_owned)
        .map_err(Error::InvalidSnapshotName)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nul_terminated_name() {
        assert_eq!(decode_snapshot_name(b"abc.snapshot\0").unwrap(), "abc.snapshot");
        assert_eq!(decode_snapshot_name(b"abc\0junk").unwrap(), "abc");
        assert_eq!(decode_snapshot_name(b"").unwrap(), "");
    }

    #[test]
    fn skips_byte_order_mark() {
        assert_eq!(
            decode_snapshot_name(b"\xef\xbb\xbfabc.snapshot").unwrap(),
            "abc.snapshot"
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            decode_snapshot_name(b"ab\xffc"),
            Err(Error::InvalidSnapshotName(_))
        ));
    }

    #[test]
    fn manifest_hash_names() {
        let hash = BootHash::ManifestHash(vec![0x01, 0xab]);

        assert_eq!(hash.identifier(), "01AB");
        assert_eq!(hash.snapshot_name(), "com.apple.os.update-01AB");
        assert_eq!(hash.to_string(), "com.apple.os.update-01AB");
        assert!(hash.is_manifest_hash());
    }

    #[test]
    fn root_snapshot_name_is_unchanged() {
        let hash = BootHash::RootSnapshotName("com.apple.os.update-XYZ".into());

        assert_eq!(hash.identifier(), "com.apple.os.update-XYZ");
        assert_eq!(hash.snapshot_name(), "com.apple.os.update-XYZ");
        assert!(!hash.is_manifest_hash());
    }
}
