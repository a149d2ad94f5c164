//! Batch iteration for training and evaluation.

use crate::dataset::{Cy101Dataset, PushDataset, PushSample};
use crate::types::{DatasetError, DatasetResult};
use burn::tensor::{backend::Backend, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::{Duration, Instant};

const DEFAULT_LOG_EVERY_SAMPLES: usize = 1000;

/// One batch of push samples, stacked along a new leading batch axis.
#[derive(Debug, Clone)]
pub struct PushBatch<B: Backend> {
    pub images: Tensor<B, 5>,
    pub actions: Tensor<B, 3>,
    pub states: Tensor<B, 3>,
}

/// One batch of CY101 image sequences.
#[derive(Debug, Clone)]
pub struct Cy101Batch<B: Backend> {
    pub images: Tensor<B, 5>,
}

fn sample_order(len: usize, shuffle: bool, seed: Option<u64>, epoch: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if shuffle {
        let mut rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed.wrapping_add(epoch)),
            None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
        };
        order.shuffle(&mut rng);
    }
    order
}

/// Rate-limited stderr progress reporting, controlled by the
/// `PUSH_DATASET_LOG_EVERY` environment variable (`off`/`0` disables).
struct Progress {
    started: Instant,
    last_log: Instant,
    last_logged_samples: usize,
    samples: usize,
    batches: usize,
    log_every_samples: Option<usize>,
}

impl Progress {
    fn from_env() -> Self {
        let log_every_samples = match std::env::var("PUSH_DATASET_LOG_EVERY") {
            Ok(val) => {
                if val.eq_ignore_ascii_case("off") || val.trim() == "0" {
                    None
                } else {
                    val.parse::<usize>().ok().filter(|v| *v > 0)
                }
            }
            Err(_) => Some(DEFAULT_LOG_EVERY_SAMPLES),
        };
        let now = Instant::now();
        Self {
            started: now,
            last_log: now,
            last_logged_samples: 0,
            samples: 0,
            batches: 0,
            log_every_samples,
        }
    }

    fn record(&mut self, batch_len: usize) {
        self.samples += batch_len;
        self.batches += 1;
        let Some(threshold) = self.log_every_samples else {
            return;
        };
        let since_last = self.last_log.elapsed();
        let processed_since = self.samples.saturating_sub(self.last_logged_samples);
        if processed_since < threshold && since_last < Duration::from_secs(30) {
            return;
        }
        let secs = self.started.elapsed().as_secs_f32().max(0.001);
        eprintln!(
            "[dataset] batches={} samples={} elapsed={:.1}s rate={:.1} samples/s",
            self.batches,
            self.samples,
            secs,
            self.samples as f32 / secs,
        );
        self.last_logged_samples = self.samples;
        self.last_log = Instant::now();
    }
}

fn check_dims<const D: usize>(expected: &mut Option<[usize; D]>, dims: [usize; D], what: &str) -> DatasetResult<()> {
    match expected {
        None => {
            *expected = Some(dims);
            Ok(())
        }
        Some(e) if *e != dims => Err(DatasetError::Other(format!(
            "batch contains varying {what} shapes ({e:?} vs {dims:?}); configure a resize transform to force consistency"
        ))),
        _ => Ok(()),
    }
}

/// Pulls samples from a [`PushDataset`] by index and groups them into
/// batches. Training iterators shuffle sample order (optionally seeded);
/// evaluation iterators run sequentially. The final partial batch is never
/// dropped.
pub struct PushBatchIter<B: Backend> {
    dataset: PushDataset<B>,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    shuffle: bool,
    seed: Option<u64>,
    epochs_completed: u64,
    progress: Progress,
}

impl<B: Backend> std::fmt::Debug for PushBatchIter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushBatchIter")
            .field("cursor", &self.cursor)
            .field("batch_size", &self.batch_size)
            .field("shuffle", &self.shuffle)
            .field("seed", &self.seed)
            .field("epochs_completed", &self.epochs_completed)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> PushBatchIter<B> {
    pub fn new(
        dataset: PushDataset<B>,
        batch_size: usize,
        shuffle: bool,
        seed: Option<u64>,
    ) -> DatasetResult<Self> {
        if batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be > 0".to_string()));
        }
        let order = sample_order(dataset.len(), shuffle, seed, 0);
        Ok(Self {
            dataset,
            order,
            cursor: 0,
            batch_size,
            shuffle,
            seed,
            epochs_completed: 0,
            progress: Progress::from_env(),
        })
    }

    /// Number of samples (not batches) this iterator covers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dataset(&self) -> &PushDataset<B> {
        &self.dataset
    }

    /// Rewind for another epoch; shuffling iterators draw a fresh order.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epochs_completed += 1;
        self.order = sample_order(
            self.dataset.len(),
            self.shuffle,
            self.seed,
            self.epochs_completed,
        );
    }

    /// Assemble the next batch, or `None` when the epoch is exhausted.
    /// Samples within a batch are loaded in parallel; result order matches
    /// the iteration order.
    pub fn next_batch(&mut self) -> DatasetResult<Option<PushBatch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let picked: Vec<usize> = self.order[self.cursor..end].to_vec();
        self.cursor = end;

        let mut loaded: Vec<(usize, DatasetResult<PushSample<B>>)> = picked
            .par_iter()
            .enumerate()
            .map(|(i, &idx)| (i, self.dataset.get(idx)))
            .collect();
        loaded.sort_by_key(|(i, _)| *i);

        let mut images = Vec::with_capacity(loaded.len());
        let mut actions = Vec::with_capacity(loaded.len());
        let mut states = Vec::with_capacity(loaded.len());
        let mut image_dims: Option<[usize; 4]> = None;
        let mut action_dims: Option<[usize; 2]> = None;
        let mut state_dims: Option<[usize; 2]> = None;
        for (_, result) in loaded {
            let sample = result?;
            check_dims(&mut image_dims, sample.image.dims(), "image")?;
            check_dims(&mut action_dims, sample.action.dims(), "action")?;
            check_dims(&mut state_dims, sample.state.dims(), "state")?;
            images.push(sample.image);
            actions.push(sample.action);
            states.push(sample.state);
        }

        let batch_len = images.len();
        let batch = PushBatch {
            images: Tensor::stack(images, 0),
            actions: Tensor::stack(actions, 0),
            states: Tensor::stack(states, 0),
        };
        self.progress.record(batch_len);
        Ok(Some(batch))
    }
}

/// Batch iterator over a [`Cy101Dataset`]; same ordering and remainder
/// contract as [`PushBatchIter`].
pub struct Cy101BatchIter<B: Backend> {
    dataset: Cy101Dataset<B>,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    shuffle: bool,
    seed: Option<u64>,
    epochs_completed: u64,
    progress: Progress,
}

impl<B: Backend> Cy101BatchIter<B> {
    pub fn new(
        dataset: Cy101Dataset<B>,
        batch_size: usize,
        shuffle: bool,
        seed: Option<u64>,
    ) -> DatasetResult<Self> {
        if batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be > 0".to_string()));
        }
        let order = sample_order(dataset.len(), shuffle, seed, 0);
        Ok(Self {
            dataset,
            order,
            cursor: 0,
            batch_size,
            shuffle,
            seed,
            epochs_completed: 0,
            progress: Progress::from_env(),
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dataset(&self) -> &Cy101Dataset<B> {
        &self.dataset
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epochs_completed += 1;
        self.order = sample_order(
            self.dataset.len(),
            self.shuffle,
            self.seed,
            self.epochs_completed,
        );
    }

    pub fn next_batch(&mut self) -> DatasetResult<Option<Cy101Batch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let picked: Vec<usize> = self.order[self.cursor..end].to_vec();
        self.cursor = end;

        let mut loaded: Vec<(usize, DatasetResult<Tensor<B, 4>>)> = picked
            .par_iter()
            .enumerate()
            .map(|(i, &idx)| (i, self.dataset.get(idx)))
            .collect();
        loaded.sort_by_key(|(i, _)| *i);

        let mut images = Vec::with_capacity(loaded.len());
        let mut image_dims: Option<[usize; 4]> = None;
        for (_, result) in loaded {
            let image = result?;
            check_dims(&mut image_dims, image.dims(), "image")?;
            images.push(image);
        }

        let batch_len = images.len();
        let batch = Cy101Batch {
            images: Tensor::stack(images, 0),
        };
        self.progress.record(batch_len);
        Ok(Some(batch))
    }
}
