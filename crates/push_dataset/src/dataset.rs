//! Dataset adapters: length + indexed access over the sample index, one
//! assembled sample per `get`.

use crate::index::{index_array_samples, index_push_samples, supported_extensions};
use crate::loader::{load_array_sample, load_push_sample, ArrayLoader, NpyLoader};
use crate::transform::TransformPipeline;
use crate::types::{DatasetError, DatasetResult, SampleGroup};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use ndarray::ArrayD;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn relocate<B: Backend, const D: usize>(
    array: ArrayD<f32>,
    device: &B::Device,
    what: &str,
) -> DatasetResult<Tensor<B, D>> {
    if array.ndim() != D {
        return Err(DatasetError::Other(format!(
            "{what} array has rank {}, expected {D}",
            array.ndim()
        )));
    }
    let shape = array.shape().to_vec();
    let data: Vec<f32> = array.into_iter().collect();
    Ok(Tensor::from_data(TensorData::new(data, shape), device))
}

/// One assembled push sample: aligned image/action/state sequences on the
/// configured device. The leading axis of every tensor is time.
#[derive(Debug, Clone)]
pub struct PushSample<B: Backend> {
    pub image: Tensor<B, 4>,
    pub action: Tensor<B, 2>,
    pub state: Tensor<B, 2>,
}

/// Construction-time options for [`PushDataset`]. Transforms default to
/// none (raw pass-through) and the loader to `.npy` deserialization.
#[derive(Clone)]
pub struct PushDatasetConfig {
    pub image_transform: Option<TransformPipeline>,
    pub action_transform: Option<TransformPipeline>,
    pub state_transform: Option<TransformPipeline>,
    pub loader: Arc<dyn ArrayLoader>,
}

impl Default for PushDatasetConfig {
    fn default() -> Self {
        Self {
            image_transform: None,
            action_transform: None,
            state_transform: None,
            loader: Arc::new(NpyLoader),
        }
    }
}

/// Multi-modal dataset over push-interaction samples.
///
/// The sample index is built once at construction and never mutated;
/// `get` is read-only, so concurrent access from multiple workers needs no
/// locking.
pub struct PushDataset<B: Backend> {
    samples: Vec<SampleGroup>,
    config: PushDatasetConfig,
    device: B::Device,
}

impl<B: Backend> std::fmt::Debug for PushDataset<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushDataset")
            .field("samples", &self.samples.len())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> PushDataset<B> {
    pub fn new(root: &Path, config: PushDatasetConfig, device: &B::Device) -> DatasetResult<Self> {
        if !root.exists() {
            return Err(DatasetError::PathNotFound {
                path: root.to_path_buf(),
            });
        }
        let samples = index_push_samples(root)?;
        if samples.is_empty() {
            return Err(DatasetError::EmptyDataset {
                root: root.to_path_buf(),
                extensions: supported_extensions(),
            });
        }
        Ok(Self {
            samples,
            config,
            device: device.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Assemble the sample at `index`: load all three modalities, apply the
    /// per-modality transforms frame-by-frame, and move the results to the
    /// configured device.
    pub fn get(&self, index: usize) -> DatasetResult<PushSample<B>> {
        let len = self.samples.len();
        let group = self
            .samples
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange { index, len })?;
        let raw = load_push_sample(
            group,
            self.config.loader.as_ref(),
            self.config.image_transform.as_ref(),
            self.config.action_transform.as_ref(),
            self.config.state_transform.as_ref(),
        )?;
        Ok(PushSample {
            image: relocate(raw.image, &self.device, "image")?,
            action: relocate(raw.action, &self.device, "action")?,
            state: relocate(raw.state, &self.device, "state")?,
        })
    }
}

/// Construction-time options for [`Cy101Dataset`].
#[derive(Clone)]
pub struct Cy101DatasetConfig {
    pub image_transform: Option<TransformPipeline>,
    pub loader: Arc<dyn ArrayLoader>,
}

impl Default for Cy101DatasetConfig {
    fn default() -> Self {
        Self {
            image_transform: None,
            loader: Arc::new(NpyLoader),
        }
    }
}

/// Single-modality dataset over CY101 image sequences, one `.npy` file per
/// sample.
pub struct Cy101Dataset<B: Backend> {
    samples: Vec<PathBuf>,
    config: Cy101DatasetConfig,
    device: B::Device,
}

impl<B: Backend> std::fmt::Debug for Cy101Dataset<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cy101Dataset")
            .field("samples", &self.samples.len())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Cy101Dataset<B> {
    pub fn new(root: &Path, config: Cy101DatasetConfig, device: &B::Device) -> DatasetResult<Self> {
        if !root.exists() {
            return Err(DatasetError::PathNotFound {
                path: root.to_path_buf(),
            });
        }
        let samples = index_array_samples(root)?;
        if samples.is_empty() {
            return Err(DatasetError::EmptyDataset {
                root: root.to_path_buf(),
                extensions: supported_extensions(),
            });
        }
        Ok(Self {
            samples,
            config,
            device: device.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Assemble the image sequence at `index` on the configured device.
    pub fn get(&self, index: usize) -> DatasetResult<Tensor<B, 4>> {
        let len = self.samples.len();
        let path = self
            .samples
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange { index, len })?;
        let image = load_array_sample(
            path,
            self.config.loader.as_ref(),
            self.config.image_transform.as_ref(),
        )?;
        relocate(image, &self.device, "image")
    }
}
