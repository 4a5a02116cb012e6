//! Synthetic frame generator for `stub://` device references.

use crate::capture::{CaptureError, CaptureSettings};
use crate::frame::Frame;

/// Produces deterministic gradient frames that change slowly over time, so
/// downstream diffing and detection stubs see plausible variation.
pub struct SyntheticSource {
    settings: CaptureSettings,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
        }
    }

    pub fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.frame_count += 1;
        let w = self.settings.width;
        let h = self.settings.height;
        let mut pixels = vec![0u8; (w as usize) * (h as usize) * 3];
        let phase = self.frame_count / 25;
        for (i, px) in pixels.iter_mut().enumerate() {
            *px = ((i as u64 + phase) % 256) as u8;
        }
        Frame::from_rgb(pixels, w, h)
            .ok_or_else(|| CaptureError::Transient("synthetic buffer size mismatch".into()))
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }
}
