//! Core types and error definitions for push_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{path} does not exist")]
    PathNotFound { path: PathBuf },
    #[error("found 0 samples in {root}; supported array extensions are: {extensions}")]
    EmptyDataset { root: PathBuf, extensions: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load array from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("transform error: {msg}")]
    Transform { msg: String },
    #[error("sample index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid loader config: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

/// The three parallel modality identifiers making up one push sample.
///
/// Each sample is stored as a directory holding one `.npy` file per
/// modality under fixed names (`image.npy`, `action.npy`, `state.npy`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGroup {
    pub image: PathBuf,
    pub action: PathBuf,
    pub state: PathBuf,
}

impl SampleGroup {
    /// Build the group for one sample directory.
    pub fn from_dir(dir: &std::path::Path) -> Self {
        Self {
            image: dir.join("image.npy"),
            action: dir.join("action.npy"),
            state: dir.join("state.npy"),
        }
    }
}
