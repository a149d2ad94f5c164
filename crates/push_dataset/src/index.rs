//! Enumerating stored samples under a dataset root.

use crate::types::{DatasetError, DatasetResult, SampleGroup};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognized for on-disk modality arrays.
pub const ARRAY_EXTENSIONS: &[&str] = &["npy"];

pub(crate) fn supported_extensions() -> String {
    ARRAY_EXTENSIONS.join(",")
}

fn read_root(root: &Path) -> DatasetResult<fs::ReadDir> {
    if !root.exists() {
        return Err(DatasetError::PathNotFound {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|e| DatasetError::Io {
        path: root.to_path_buf(),
        source: e,
    })
}

/// Enumerate the direct sub-directories of `root` as push sample groups.
///
/// Each sub-directory is one sample; its three modality files are resolved
/// by fixed name via [`SampleGroup::from_dir`]. Entries are kept in
/// directory-listing order, not sorted: index-based access is reproducible
/// within one process run, which is the contract downstream consumers rely
/// on. Fails with [`DatasetError::PathNotFound`] when `root` is missing and
/// [`DatasetError::EmptyDataset`] when no sample directory is found.
pub fn index_push_samples(root: &Path) -> DatasetResult<Vec<SampleGroup>> {
    let mut groups = Vec::new();
    for entry in read_root(root)? {
        let entry = entry.map_err(|e| DatasetError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        groups.push(SampleGroup::from_dir(&dir));
    }
    if groups.is_empty() {
        return Err(DatasetError::EmptyDataset {
            root: root.to_path_buf(),
            extensions: supported_extensions(),
        });
    }
    Ok(groups)
}

/// Enumerate the direct `.npy` entries of `root` as single-modality samples.
///
/// Same ordering and failure contract as [`index_push_samples`]; entries
/// whose extension is not recognized are ignored.
pub fn index_array_samples(root: &Path) -> DatasetResult<Vec<PathBuf>> {
    let mut samples = Vec::new();
    for entry in read_root(root)? {
        let entry = entry.map_err(|e| DatasetError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let recognized = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ARRAY_EXTENSIONS.contains(&ext));
        if !recognized {
            continue;
        }
        samples.push(path);
    }
    if samples.is_empty() {
        return Err(DatasetError::EmptyDataset {
            root: root.to_path_buf(),
            extensions: supported_extensions(),
        });
    }
    Ok(samples)
}
