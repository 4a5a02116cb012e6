//! Scriptable stub backend for tests and featureless builds.

use crate::detect::{Detection, DetectorBackend, InferenceError};
use crate::frame::Frame;

/// Replays a scripted sequence of candidate lists, one per frame. After the
/// script is exhausted it reports no candidates. Can also be configured to
/// fail every call, to exercise the containment path.
pub struct StubBackend {
    script: std::vec::IntoIter<Vec<Detection>>,
    failure: Option<String>,
}

impl StubBackend {
    /// A backend that never detects anything.
    pub fn quiet() -> Self {
        Self::with_candidates(Vec::new())
    }

    pub fn with_candidates(per_frame: Vec<Vec<Detection>>) -> Self {
        Self {
            script: per_frame.into_iter(),
            failure: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            script: Vec::new().into_iter(),
            failure: Some(reason.to_string()),
        }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, InferenceError> {
        if let Some(reason) = &self.failure {
            return Err(InferenceError(reason.clone()));
        }
        Ok(self.script.next().unwrap_or_default())
    }
}
