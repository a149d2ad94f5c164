//! Per-frame transform pipeline.
//!
//! A transform maps one frame to one frame and never looks across the time
//! axis; the loader applies it to every slice of a modality array
//! independently and re-stacks the results in original order.

use crate::types::{DatasetError, DatasetResult};
use image::imageops::FilterType;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use std::sync::Arc;

/// A pure function from one frame to one (possibly differently-shaped)
/// frame. Implementations must not carry per-call state that affects the
/// output: the loader relies on the result being a function of the input
/// frame alone.
pub trait FrameTransform: Send + Sync {
    fn apply(&self, frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>>;
}

/// Ordered composition of [`FrameTransform`] steps.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    steps: Vec<Arc<dyn FrameTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step, builder style.
    pub fn then<T: FrameTransform + 'static>(mut self, step: T) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>> {
        let mut frame = frame;
        for step in &self.steps {
            frame = step.apply(frame)?;
        }
        Ok(frame)
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

fn require_chw(frame: &ArrayD<f32>, what: &str) -> DatasetResult<(usize, usize, usize)> {
    if frame.ndim() != 3 {
        return Err(DatasetError::Transform {
            msg: format!(
                "{what} expects a CHW image frame, got rank {}",
                frame.ndim()
            ),
        });
    }
    let shape = frame.shape();
    Ok((shape[0], shape[1], shape[2]))
}

/// Bilinear resize of a CHW image frame to a fixed (height, width).
///
/// Values are clamped to [0, 1] and routed through 8-bit image buffers,
/// matching how capture frames are stored before training.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub height: u32,
    pub width: u32,
}

impl FrameTransform for Resize {
    fn apply(&self, frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>> {
        let (channels, height, width) = require_chw(&frame, "resize")?;
        let quantize =
            |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let out_h = self.height as usize;
        let out_w = self.width as usize;
        match channels {
            3 => {
                let mut img = image::RgbImage::new(width as u32, height as u32);
                for y in 0..height {
                    for x in 0..width {
                        img.put_pixel(
                            x as u32,
                            y as u32,
                            image::Rgb([
                                quantize(frame[[0, y, x]]),
                                quantize(frame[[1, y, x]]),
                                quantize(frame[[2, y, x]]),
                            ]),
                        );
                    }
                }
                let resized =
                    image::imageops::resize(&img, self.width, self.height, FilterType::Triangle);
                let mut out = ArrayD::zeros(IxDyn(&[3, out_h, out_w]));
                for (x, y, pixel) in resized.enumerate_pixels() {
                    for c in 0..3 {
                        out[[c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                    }
                }
                Ok(out)
            }
            1 => {
                let mut img = image::GrayImage::new(width as u32, height as u32);
                for y in 0..height {
                    for x in 0..width {
                        img.put_pixel(x as u32, y as u32, image::Luma([quantize(frame[[0, y, x]])]));
                    }
                }
                let resized =
                    image::imageops::resize(&img, self.width, self.height, FilterType::Triangle);
                let mut out = ArrayD::zeros(IxDyn(&[1, out_h, out_w]));
                for (x, y, pixel) in resized.enumerate_pixels() {
                    out[[0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
                }
                Ok(out)
            }
            other => Err(DatasetError::Transform {
                msg: format!("resize supports 1- or 3-channel frames, got {other}"),
            }),
        }
    }
}

/// Crop a CHW frame to a square of side min(height, width), anchored at the
/// origin. Deterministic: the same frame always yields the same crop.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropSquare;

impl FrameTransform for CropSquare {
    fn apply(&self, frame: ArrayD<f32>) -> DatasetResult<ArrayD<f32>> {
        let (_, height, width) = require_chw(&frame, "crop")?;
        let side = height.min(width) as isize;
        let cropped = frame
            .slice_axis(Axis(1), Slice::new(0, Some(side), 1))
            .slice_axis(Axis(2), Slice::new(0, Some(side), 1))
            .to_owned();
        Ok(cropped)
    }
}

#[cfg(test)]
mod transform_tests {
    use super::*;
    use ndarray::Array3;

    fn chw(c: usize, h: usize, w: usize) -> ArrayD<f32> {
        Array3::<f32>::zeros((c, h, w)).into_dyn()
    }

    #[test]
    fn crop_square_uses_min_side_anchored_at_origin() {
        let mut frame = chw(3, 6, 10);
        frame[[0, 0, 0]] = 0.5;
        frame[[0, 5, 5]] = 0.25;
        frame[[0, 0, 9]] = 1.0; // outside the 6x6 crop
        let out = CropSquare.apply(frame).unwrap();
        assert_eq!(out.shape(), &[3, 6, 6]);
        assert_eq!(out[[0, 0, 0]], 0.5);
        assert_eq!(out[[0, 5, 5]], 0.25);
        assert!(out.iter().all(|&v| v < 1.0));
    }

    #[test]
    fn crop_square_is_identity_for_square_frames() {
        let frame = chw(3, 4, 4);
        let out = CropSquare.apply(frame.clone()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn resize_produces_configured_dims() {
        let frame = chw(3, 6, 10);
        let out = Resize {
            height: 4,
            width: 4,
        }
        .apply(frame)
        .unwrap();
        assert_eq!(out.shape(), &[3, 4, 4]);
    }

    #[test]
    fn resize_preserves_constant_frames() {
        let mut frame = chw(1, 8, 8);
        frame.fill(0.5);
        let out = Resize {
            height: 3,
            width: 5,
        }
        .apply(frame)
        .unwrap();
        assert_eq!(out.shape(), &[1, 3, 5]);
        for &v in out.iter() {
            assert!((v - 0.5).abs() < 0.01, "expected ~0.5, got {v}");
        }
    }

    #[test]
    fn resize_rejects_non_image_frames() {
        let frame = ndarray::Array1::<f32>::zeros(4).into_dyn();
        let err = Resize {
            height: 2,
            width: 2,
        }
        .apply(frame)
        .unwrap_err();
        assert!(matches!(err, DatasetError::Transform { .. }));
    }

    #[test]
    fn pipeline_applies_steps_in_order() {
        let pipeline = TransformPipeline::new().then(CropSquare).then(Resize {
            height: 2,
            width: 2,
        });
        let out = pipeline.apply(chw(3, 6, 10)).unwrap();
        assert_eq!(out.shape(), &[3, 2, 2]);
    }
}
