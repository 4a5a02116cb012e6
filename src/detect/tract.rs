#![cfg(feature = "backend-tract")]

//! Tract-based ONNX backend.
//!
//! Loads a YOLO-family model once at startup and decodes its `[1, 4+C, N]`
//! output head: per anchor, a center/size box in model input coordinates
//! plus one score per class. Boxes are mapped back to frame coordinates
//! here; thresholding, ordering and suppression stay in `Detector`.

use std::path::Path;

use tract_onnx::prelude::*;

use crate::detect::{BoundingBox, Detection, DetectorBackend, InferenceError, ModelLoadError};
use crate::frame::Frame;
use crate::labels::CLASS_COUNT;

pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
}

impl TractBackend {
    /// Load and optimize the ONNX artifact. Fatal on any failure.
    pub fn load(
        model_path: &Path,
        input_width: u32,
        input_height: u32,
    ) -> Result<Self, ModelLoadError> {
        let load_err = |reason: String| ModelLoadError {
            reference: model_path.display().to_string(),
            reason,
        };

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| load_err(format!("read artifact: {e}")))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .map_err(|e| load_err(format!("set input fact: {e}")))?
            .into_optimized()
            .map_err(|e| load_err(format!("optimize: {e}")))?
            .into_runnable()
            .map_err(|e| load_err(format!("build plan: {e}")))?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    /// Nearest-neighbour sample the frame into a normalized NCHW tensor.
    /// The frame is stretched onto the model square; `decode` applies the
    /// inverse mapping to the predicted boxes.
    fn build_input(&self, frame: &Frame) -> Result<Tensor, InferenceError> {
        let (fw, fh) = (frame.width as usize, frame.height as usize);
        if fw == 0 || fh == 0 {
            return Err(InferenceError("empty frame".into()));
        }
        let (iw, ih) = (self.input_width as usize, self.input_height as usize);
        let pixels = frame.pixels();

        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, ih, iw), |(_, channel, y, x)| {
                let src_x = (x * fw / iw).min(fw - 1);
                let src_y = (y * fh / ih).min(fh - 1);
                let idx = (src_y * fw + src_x) * 3 + channel;
                f32::from(pixels[idx]) / 255.0
            });

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<Detection>, InferenceError> {
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError(format!("output tensor was not f32: {e}")))?;
        let view = view
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| InferenceError(format!("unexpected output rank: {e}")))?;

        let attrs = view.shape()[1];
        let anchors = view.shape()[2];
        if attrs < 5 {
            return Err(InferenceError(format!(
                "output head too narrow: {attrs} attributes"
            )));
        }
        let classes = (attrs - 4).min(CLASS_COUNT);

        let scale_x = frame.width as f32 / self.input_width as f32;
        let scale_y = frame.height as f32 / self.input_height as f32;

        let mut candidates = Vec::new();
        for a in 0..anchors {
            let mut best_class = 0usize;
            let mut best_score = 0.0f32;
            for c in 0..classes {
                let score = view[[0, 4 + c, a]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }
            // Cheap prefilter; the real threshold is applied by Detector.
            if best_score < 0.05 {
                continue;
            }

            let cx = view[[0, 0, a]] * scale_x;
            let cy = view[[0, 1, a]] * scale_y;
            let w = view[[0, 2, a]] * scale_x;
            let h = view[[0, 3, a]] * scale_y;
            candidates.push(Detection {
                class_id: best_class as u16,
                confidence: best_score,
                bbox: BoundingBox {
                    x1: cx - w / 2.0,
                    y1: cy - h / 2.0,
                    x2: cx + w / 2.0,
                    y2: cy + h / 2.0,
                },
            });
        }
        Ok(candidates)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, InferenceError> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError(format!("plan execution: {e}")))?;
        self.decode(outputs, frame)
    }
}
