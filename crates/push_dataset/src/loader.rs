//! Loading raw modality arrays and assembling per-sample tensors.

use crate::transform::TransformPipeline;
use crate::types::{DatasetError, DatasetResult, SampleGroup};
use ndarray::{ArrayD, Axis};
use ndarray_npy::read_npy;
use std::path::Path;

/// Maps one stored identifier to a raw modality array.
///
/// The default implementation deserializes NumPy `.npy` files; tests and
/// alternative storage formats substitute their own.
pub trait ArrayLoader: Send + Sync {
    fn load(&self, path: &Path) -> DatasetResult<ArrayD<f32>>;
}

/// NumPy `.npy` deserialization, little-endian f32.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyLoader;

impl ArrayLoader for NpyLoader {
    fn load(&self, path: &Path) -> DatasetResult<ArrayD<f32>> {
        read_npy(path).map_err(|e| DatasetError::Load {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }
}

/// Apply `pipeline` independently to every frame along the leading (time)
/// axis and re-stack the results in original order.
///
/// `None` passes the raw array through unchanged. The output frame count
/// always equals the input frame count; transforms may change per-frame
/// shape but must agree on it across frames.
pub fn apply_per_frame(
    array: ArrayD<f32>,
    pipeline: Option<&TransformPipeline>,
) -> DatasetResult<ArrayD<f32>> {
    let Some(pipeline) = pipeline else {
        return Ok(array);
    };
    if array.ndim() == 0 {
        return Err(DatasetError::Transform {
            msg: "cannot iterate frames of a rank-0 array".to_string(),
        });
    }
    let mut frames = Vec::with_capacity(array.len_of(Axis(0)));
    for frame in array.axis_iter(Axis(0)) {
        frames.push(pipeline.apply(frame.to_owned())?);
    }
    let views: Vec<_> = frames.iter().map(|f| f.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| DatasetError::Transform {
        msg: format!("transformed frames do not share a common shape: {e}"),
    })
}

/// The per-modality arrays of one push sample, transforms applied, not yet
/// moved to the compute device.
#[derive(Debug, Clone)]
pub struct RawPushSample {
    pub image: ArrayD<f32>,
    pub action: ArrayD<f32>,
    pub state: ArrayD<f32>,
}

pub(crate) fn load_push_sample(
    group: &SampleGroup,
    loader: &dyn ArrayLoader,
    image_transform: Option<&TransformPipeline>,
    action_transform: Option<&TransformPipeline>,
    state_transform: Option<&TransformPipeline>,
) -> DatasetResult<RawPushSample> {
    let image = apply_per_frame(loader.load(&group.image)?, image_transform)?;
    let action = apply_per_frame(loader.load(&group.action)?, action_transform)?;
    let state = apply_per_frame(loader.load(&group.state)?, state_transform)?;
    Ok(RawPushSample {
        image,
        action,
        state,
    })
}

pub(crate) fn load_array_sample(
    path: &Path,
    loader: &dyn ArrayLoader,
    image_transform: Option<&TransformPipeline>,
) -> DatasetResult<ArrayD<f32>> {
    apply_per_frame(loader.load(path)?, image_transform)
}

#[cfg(test)]
mod loader_tests {
    use super::*;
    use crate::transform::FrameTransform;
    use ndarray::{Array2, Array3};

    struct Doubler;

    impl FrameTransform for Doubler {
        fn apply(&self, frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>> {
            Ok(frame * 2.0)
        }
    }

    struct Failing;

    impl FrameTransform for Failing {
        fn apply(&self, _frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>> {
            Err(DatasetError::Transform {
                msg: "boom".to_string(),
            })
        }
    }

    #[test]
    fn no_pipeline_passes_raw_array_through() {
        let array = Array3::<f32>::ones((4, 2, 2)).into_dyn();
        let out = apply_per_frame(array.clone(), None).unwrap();
        assert_eq!(out, array);
    }

    #[test]
    fn per_frame_application_preserves_frame_count() {
        let array = Array2::<f32>::ones((5, 3)).into_dyn();
        let pipeline = TransformPipeline::new().then(Doubler);
        let out = apply_per_frame(array, Some(&pipeline)).unwrap();
        assert_eq!(out.shape(), &[5, 3]);
        assert!(out.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn transform_failure_aborts_the_whole_sample() {
        let array = Array2::<f32>::ones((5, 3)).into_dyn();
        let pipeline = TransformPipeline::new().then(Failing);
        let err = apply_per_frame(array, Some(&pipeline)).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn npy_loader_round_trips_written_arrays() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sample.npy");
        let array = Array3::<f32>::from_shape_fn((2, 3, 4), |(t, r, c)| {
            (t * 100 + r * 10 + c) as f32
        });
        ndarray_npy::write_npy(&path, &array).unwrap();
        let loaded = NpyLoader.load(&path).unwrap();
        assert_eq!(loaded, array.into_dyn());
    }

    #[test]
    fn npy_loader_surfaces_deserialization_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("garbage.npy");
        std::fs::write(&path, b"not an npy file").unwrap();
        let err = NpyLoader.load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Load { .. }));
    }
}
