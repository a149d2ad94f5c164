//! Factory entry points wiring datasets to batch iterators.

use crate::batch::{Cy101BatchIter, PushBatchIter};
use crate::dataset::{Cy101Dataset, Cy101DatasetConfig, PushDataset, PushDatasetConfig};
use crate::transform::{CropSquare, Resize, TransformPipeline};
use crate::types::{DatasetError, DatasetResult};
use burn::tensor::backend::Backend;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration consumed by the factory functions. Passed by value,
/// validated before use, never ambient state.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Dataset root; the factories look up fixed split subdirectories
    /// underneath it.
    pub data_dir: PathBuf,
    pub batch_size: usize,
    /// Target frame height after the image pipeline.
    pub height: u32,
    /// Target frame width after the image pipeline.
    pub width: u32,
    /// Seed for the training iterator's shuffle; `None` draws a fresh
    /// order every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LoaderConfig {
    pub fn validate(&self) -> DatasetResult<()> {
        if self.batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be > 0".to_string()));
        }
        if self.height == 0 || self.width == 0 {
            return Err(DatasetError::Config(
                "height and width must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> DatasetResult<Self> {
        let raw = fs::read(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cfg: Self = serde_json::from_slice(&raw).map_err(|e| {
            DatasetError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Build (train, test-seen) batch iterators over the `push_train` and
/// `push_testseen` subdirectories of `data_dir`. Images are resized
/// frame-by-frame to the configured (height, width); actions and states
/// pass through raw. The training iterator shuffles, the evaluation
/// iterator is sequential, and neither drops the final partial batch.
pub fn build_dataloaders<B: Backend>(
    cfg: &LoaderConfig,
    device: &B::Device,
) -> DatasetResult<(PushBatchIter<B>, PushBatchIter<B>)> {
    cfg.validate()?;
    let image_transform = TransformPipeline::new().then(Resize {
        height: cfg.height,
        width: cfg.width,
    });
    let dataset_config = PushDatasetConfig {
        image_transform: Some(image_transform),
        ..Default::default()
    };

    let train_ds = PushDataset::new(
        &cfg.data_dir.join("push_train"),
        dataset_config.clone(),
        device,
    )?;
    let testseen_ds = PushDataset::new(
        &cfg.data_dir.join("push_testseen"),
        dataset_config,
        device,
    )?;

    let train = PushBatchIter::new(train_ds, cfg.batch_size, true, cfg.seed)?;
    let testseen = PushBatchIter::new(testseen_ds, cfg.batch_size, false, None)?;
    Ok((train, testseen))
}

/// Build (train, valid) batch iterators over the `train` and `valid`
/// subdirectories of `data_dir`. Each frame is cropped to an
/// origin-anchored min(H, W) square before the resize.
pub fn build_dataloaders_cy101<B: Backend>(
    cfg: &LoaderConfig,
    device: &B::Device,
) -> DatasetResult<(Cy101BatchIter<B>, Cy101BatchIter<B>)> {
    cfg.validate()?;
    let image_transform = TransformPipeline::new().then(CropSquare).then(Resize {
        height: cfg.height,
        width: cfg.width,
    });
    let dataset_config = Cy101DatasetConfig {
        image_transform: Some(image_transform),
        ..Default::default()
    };

    let train_ds = Cy101Dataset::new(&cfg.data_dir.join("train"), dataset_config.clone(), device)?;
    let valid_ds = Cy101Dataset::new(&cfg.data_dir.join("valid"), dataset_config, device)?;

    let train = Cy101BatchIter::new(train_ds, cfg.batch_size, true, cfg.seed)?;
    let valid = Cy101BatchIter::new(valid_ds, cfg.batch_size, false, None)?;
    Ok((train, valid))
}
