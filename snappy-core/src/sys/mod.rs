//! macOS bindings: snapshot enumeration on a mounted volume and the IOKit
//! device tree.

mod device_tree;
mod ffi;

use std::fs::File;
use std::io;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};

pub use self::device_tree::{IoDeviceTree, IoRegistryEntry};

use crate::attr::{AttributeSource, CommonAttr};
use crate::{boot_hash, snapshot, Error, ListOptions, Result, SnapshotList, SnapshotName};

/// Pages snapshot names out of the volume behind a directory descriptor.
pub struct VolumeSnapshots<'a> {
    fd: BorrowedFd<'a>,
    attrs: ffi::attrlist,
}

impl<'a> VolumeSnapshots<'a> {
    /// Start an enumeration from the beginning of the snapshot list.
    pub fn new(fd: BorrowedFd<'a>) -> io::Result<VolumeSnapshots<'a>> {
        // The kernel keeps the enumeration position on the descriptor.
        if unsafe { libc::lseek(fd.as_raw_fd(), 0, libc::SEEK_SET) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(VolumeSnapshots {
            fd,
            attrs: ffi::attrlist {
                bitmapcount: ffi::ATTR_BIT_MAP_COUNT,
                commonattr: CommonAttr::BULK_REQUIRED.bits(),
                ..Default::default()
            },
        })
    }
}

impl AttributeSource for VolumeSnapshots<'_> {
    fn next_page(&mut self, page: &mut [u8]) -> io::Result<usize> {
        let count = unsafe {
            ffi::fs_snapshot_list(
                self.fd.as_raw_fd(),
                &mut self.attrs,
                page.as_mut_ptr().cast(),
                page.len(),
                0,
            )
        };

        if count < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(count as usize)
    }
}

/// The root directory of a mounted volume.
#[derive(Debug)]
pub struct Volume {
    dir: File,
    path: PathBuf,
}

impl Volume {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Volume> {
        let path = path.as_ref().to_path_buf();
        let dir = File::open(&path)?;
        Ok(Volume { dir, path })
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn source(&self) -> io::Result<VolumeSnapshots<'_>> {
        VolumeSnapshots::new(self.dir.as_fd())
    }

    pub fn snapshots(&self, options: &ListOptions) -> Result<SnapshotList> {
        let mut source = self.source().map_err(Error::Paging)?;
        snapshot::list_snapshots(&mut source, options)
    }

    pub fn has_snapshot<N: AsRef<[u8]>>(&self, name: N) -> bool {
        match self.source() {
            Ok(mut source) => snapshot::has_snapshot(&mut source, name),
            Err(err) => {
                tracing::debug!(error = %err, path = %self.path.display(), "cannot rewind volume");
                false
            }
        }
    }

    pub fn first_snapshot(&self) -> Option<SnapshotName> {
        match self.source() {
            Ok(mut source) => snapshot::first_snapshot(&mut source),
            Err(err) => {
                tracing::debug!(error = %err, path = %self.path.display(), "cannot rewind volume");
                None
            }
        }
    }
}

/// The name of the snapshot the running system booted from.
pub fn system_snapshot() -> Result<String> {
    boot_hash::system_snapshot_with(&IoDeviceTree)
}
