use std::fmt;

use crate::attr::{AttributeSource, PageBuffer, Records, MAX_RECORD_SIZE};
use crate::{Error, Result};

/// Default cap on the number of names a listing returns.
pub const DEFAULT_MAX_SNAPSHOTS: usize = 256;

const INITIAL_SLOTS: usize = 16;

/// The name of one snapshot, exactly as the filesystem reported it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName(Vec<u8>);

impl SnapshotName {
    fn copy_from(bytes: &[u8]) -> Result<SnapshotName> {
        let mut name = Vec::new();
        name.try_reserve_exact(bytes.len())?;
        name.extend_from_slice(bytes);
        Ok(SnapshotName(name))
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as a string slice, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&str> for SnapshotName {
    fn from(name: &str) -> Self {
        SnapshotName(name.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for SnapshotName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for SnapshotName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for SnapshotName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotName({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Names past this count are dropped and the list is marked truncated.
    pub max_snapshots: usize,
    /// Size of the buffer each page of records is read into.
    pub page_size: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        ListOptions {
            max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            page_size: MAX_RECORD_SIZE,
        }
    }
}

impl ListOptions {
    pub fn with_max_snapshots(mut self, max_snapshots: usize) -> Self {
        self.max_snapshots = max_snapshots;
        self
    }
}

/// Snapshot names in the order the filesystem enumerated them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotList {
    names: Vec<SnapshotName>,
    truncated: bool,
}

impl SnapshotList {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether names were dropped because the listing hit its cap.
    #[inline(always)]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[inline(always)]
    pub fn first(&self) -> Option<&SnapshotName> {
        self.names.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotName> {
        self.names.iter()
    }

    pub fn as_slice(&self) -> &[SnapshotName] {
        &self.names
    }

    /// Exact, byte-for-byte membership.
    pub fn contains<N: AsRef<[u8]>>(&self, name: N) -> bool {
        let name = name.as_ref();
        self.names.iter().any(|n| n.as_bytes() == name)
    }

    pub fn into_names(self) -> Vec<SnapshotName> {
        self.names
    }
}

impl IntoIterator for SnapshotList {
    type Item = SnapshotName;
    type IntoIter = std::vec::IntoIter<SnapshotName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a SnapshotList {
    type Item = &'a SnapshotName;
    type IntoIter = std::slice::Iter<'a, SnapshotName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Page through `source` and collect the name of every snapshot it reports.
///
/// Records that did not return a name are skipped. Once `max_snapshots` names
/// have been collected, the next name stops the listing: the names gathered so
/// far are returned with [`SnapshotList::is_truncated`] set. Any paging or
/// allocation failure discards the partial list.
pub fn list_snapshots<S: AttributeSource + ?Sized>(
    source: &mut S,
    options: &ListOptions,
) -> Result<SnapshotList> {
    let mut page = PageBuffer::new(options.page_size)?;
    let mut names: Vec<SnapshotName> = Vec::new();
    names.try_reserve(options.max_snapshots.min(INITIAL_SLOTS))?;

    loop {
        page.clear();

        let count = source
            .next_page(page.as_bytes_mut())
            .map_err(Error::Paging)?;
        if count == 0 {
            break;
        }

        tracing::debug!(count, "paged snapshot attributes");

        for record in Records::new(page.as_bytes(), count) {
            let record = record?;

            let name = match record.name {
                Some(name) => name,
                None => {
                    tracing::debug!(offset = record.offset, "skipping record without a name");
                    continue;
                }
            };

            if names.len() >= options.max_snapshots {
                tracing::warn!(
                    limit = options.max_snapshots,
                    "too many snapshots to handle; returning the first {}",
                    names.len()
                );
                return Ok(SnapshotList {
                    names,
                    truncated: true,
                });
            }

            names.try_reserve(1)?;
            names.push(SnapshotName::copy_from(name)?);
        }
    }

    tracing::debug!(count = names.len(), "listed snapshots");

    Ok(SnapshotList {
        names,
        truncated: false,
    })
}

/// Whether `source` has a snapshot named exactly `name`.
///
/// A failed listing counts as "no".
pub fn has_snapshot<S, N>(source: &mut S, name: N) -> bool
where
    S: AttributeSource + ?Sized,
    N: AsRef<[u8]>,
{
    match list_snapshots(source, &ListOptions::default()) {
        Ok(list) => list.contains(name),
        Err(err) => {
            tracing::debug!(error = %err, "cannot list snapshots");
            false
        }
    }
}

/// The first snapshot `source` enumerates, if any.
pub fn first_snapshot<S: AttributeSource + ?Sized>(source: &mut S) -> Option<SnapshotName> {
    match list_snapshots(source, &ListOptions::default()) {
        Ok(list) => list.into_iter().next(),
        Err(err) => {
            tracing::debug!(error = %err, "cannot list snapshots");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Serves names one record per page, padded the way the kernel pads them.
    struct OnePerPage(std::vec::IntoIter<&'static str>);

    impl AttributeSource for OnePerPage {
        fn next_page(&mut self, page: &mut [u8]) -> io::Result<usize> {
            let name = match self.0.next() {
                Some(v) => v,
                None => return Ok(0),
            };

            let length = (32 + name.len() + 1 + 3) & !3;
            page[..4].copy_from_slice(&(length as u32).to_ne_bytes());
            page[4..8].copy_from_slice(&0x8000_0001u32.to_ne_bytes());
            page[24..28].copy_from_slice(&8i32.to_ne_bytes());
            page[28..32].copy_from_slice(&(name.len() as u32 + 1).to_ne_bytes());
            page[32..32 + name.len()].copy_from_slice(name.as_bytes());
            Ok(1)
        }
    }

    fn source(names: &[&'static str]) -> OnePerPage {
        OnePerPage(names.to_vec().into_iter())
    }

    #[test]
    fn lists_in_order() {
        let list = list_snapshots(&mut source(&["a", "b", "c"]), &ListOptions::default()).unwrap();

        let expected: Vec<SnapshotName> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(list.len(), 3);
        assert!(!list.is_truncated());
        assert_eq!(list.as_slice(), expected.as_slice());
    }

    #[test]
    fn empty_volume_is_an_empty_list() {
        let list = list_snapshots(&mut source(&[]), &ListOptions::default()).unwrap();

        assert!(list.is_empty());
        assert!(list.first().is_none());
        assert!(!list.is_truncated());
    }

    #[test]
    fn cap_is_configurable() {
        let options = ListOptions::default().with_max_snapshots(2);
        let list = list_snapshots(&mut source(&["a", "b", "c", "d"]), &options).unwrap();

        assert_eq!(list.len(), 2);
        assert!(list.is_truncated());
        assert_eq!(list.first().unwrap(), "a");
    }

    #[test]
    fn exactly_at_cap_is_not_truncated() {
        let options = ListOptions::default().with_max_snapshots(2);
        let list = list_snapshots(&mut source(&["a", "b"]), &options).unwrap();

        assert_eq!(list.len(), 2);
        assert!(!list.is_truncated());
    }

    #[test]
    fn contains_is_exact() {
        let list = list_snapshots(&mut source(&["snapshot"]), &ListOptions::default()).unwrap();

        assert!(list.contains("snapshot"));
        assert!(!list.contains("snap"));
        assert!(!list.contains("snapshots"));
        assert!(!list.contains(""));
    }

    #[test]
    fn display_is_lossy() {
        let name = SnapshotName(vec![b'a', 0xff, b'b']);
        assert_eq!(name.to_string(), "a\u{fffd}b");
        assert_eq!(name.to_str(), None);
    }
}
