//! Dataset indexing, per-sample assembly, and batching for robot
//! push-interaction sequences.
//!
//! This crate provides:
//! - Sample indexing over a root directory of stored `.npy` sequences
//! - Per-sample loading with independent per-modality, per-frame transform
//!   pipelines
//! - Dataset adapters exposing a length + indexed-access contract
//! - Batch iterators (shuffled training / sequential evaluation) producing
//!   device-resident tensors
//! - Factory entry points for the push and CY101 directory layouts

pub mod batch;
pub mod dataset;
pub mod factory;
pub mod index;
pub mod loader;
pub mod transform;
pub mod types;

pub use batch::{Cy101Batch, Cy101BatchIter, PushBatch, PushBatchIter};
pub use dataset::{Cy101Dataset, Cy101DatasetConfig, PushDataset, PushDatasetConfig, PushSample};
pub use factory::{build_dataloaders, build_dataloaders_cy101, LoaderConfig};
pub use index::{index_array_samples, index_push_samples, ARRAY_EXTENSIONS};
pub use loader::{apply_per_frame, ArrayLoader, NpyLoader, RawPushSample};
pub use transform::{CropSquare, FrameTransform, Resize, TransformPipeline};
pub use types::{DatasetError, DatasetResult, SampleGroup};
