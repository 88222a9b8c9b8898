use std::path::{Path, PathBuf};

use snappy_core::{ListOptions, Volume};

use crate::error::{Error, Result};

fn open(path: &Path) -> Result<Volume> {
    Volume::open(path).map_err(|source| Error::OpenVolume {
        path: path.to_path_buf(),
        source,
    })
}

pub fn list(path: PathBuf, options: ListOptions) -> Result<()> {
    let volume = open(&path)?;
    let snapshots = volume
        .snapshots(&options)
        .map_err(|source| Error::ListSnapshots {
            path: path.clone(),
            source,
        })?;

    for name in &snapshots {
        println!("{}", name);
    }

    tracing::debug!(
        count = snapshots.len(),
        truncated = snapshots.is_truncated(),
        path = %path.display(),
        "listed snapshots"
    );

    Ok(())
}

pub fn check(path: PathBuf, name: String) -> Result<()> {
    let volume = open(&path)?;

    if volume.has_snapshot(&name) {
        println!("{}", name);
        Ok(())
    } else {
        Err(Error::SnapshotNotFound { path, name })
    }
}

pub fn first(path: PathBuf) -> Result<()> {
    let volume = open(&path)?;

    match volume.first_snapshot() {
        Some(name) => {
            println!("{}", name);
            Ok(())
        }
        None => Err(Error::NoSnapshots { path }),
    }
}

pub fn system() -> Result<()> {
    let name = snappy_core::system_snapshot().map_err(|source| Error::SystemSnapshot { source })?;
    println!("{}", name);
    Ok(())
}
