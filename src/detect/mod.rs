//! Neural detection.
//!
//! A `DetectorBackend` produces raw candidate detections for a frame; the
//! `Detector` wrapper owns the thresholds and the per-frame failure policy.
//! Backend errors are contained here: a failing inference degrades to an
//! empty `DetectionSet` with a logged warning and never aborts the loop.

mod nms;
mod result;
mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use nms::iou;
pub use result::{BoundingBox, Detection, DetectionSet};
pub use stub::StubBackend;
#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;

use thiserror::Error;

use crate::frame::Frame;

/// Fatal at startup: the inference artifact is missing or incompatible.
#[derive(Debug, Error)]
#[error("failed to load model '{reference}': {reason}")]
pub struct ModelLoadError {
    pub reference: String,
    pub reason: String,
}

/// Per-frame inference failure. Contained by `Detector::infer`.
#[derive(Debug, Error)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Detection backend. Implementations report raw candidates; filtering,
/// ordering and overlap suppression happen in `Detector`.
pub trait DetectorBackend {
    fn name(&self) -> &'static str;

    /// Run the model on one frame. The frame is read-only and must not be
    /// retained beyond this call.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, InferenceError>;
}

/// The detector used by the frame loop: one backend plus the configured
/// thresholds, loaded once at startup.
pub struct Detector {
    backend: Box<dyn DetectorBackend>,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl Detector {
    pub fn new(
        backend: Box<dyn DetectorBackend>,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Self {
        Self {
            backend,
            confidence_threshold,
            iou_threshold,
        }
    }

    /// Load the ONNX artifact and build a tract-backed detector.
    #[cfg(feature = "backend-tract")]
    pub fn initialize(
        model_reference: &std::path::Path,
        input_width: u32,
        input_height: u32,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Self, ModelLoadError> {
        let backend = TractBackend::load(model_reference, input_width, input_height)?;
        Ok(Self::new(
            Box::new(backend),
            confidence_threshold,
            iou_threshold,
        ))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run inference on one frame and post-process the candidates.
    ///
    /// Never fails: a backend error is logged and yields an empty set.
    pub fn infer(&mut self, frame: &Frame) -> DetectionSet {
        match self.backend.detect(frame) {
            Ok(candidates) => DetectionSet::from_candidates(
                candidates,
                self.confidence_threshold,
                self.iou_threshold,
                frame.width,
                frame.height,
            ),
            Err(err) => {
                log::warn!("{} backend: {}", self.backend.name(), err);
                DetectionSet::empty()
            }
        }
    }
}
