//! Captured frame container.
//!
//! A `Frame` is owned exclusively by the loop cycle that captured it and is
//! dropped once rendering for that cycle completes. Pixel data is packed
//! RGB24, row-major, no padding.

use std::time::Instant;

/// One captured camera frame.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture timestamp, consumed by the frame-rate estimator.
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap raw RGB24 bytes. Returns `None` when the buffer length does not
    /// match `width * height * 3`.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?.checked_mul(3)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            captured_at: Instant::now(),
        })
    }

    /// Packed RGB24 pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_validates_buffer_length() {
        assert!(Frame::from_rgb(vec![0u8; 4 * 4 * 3], 4, 4).is_some());
        assert!(Frame::from_rgb(vec![0u8; 10], 4, 4).is_none());
    }

    #[test]
    fn from_rgb_rejects_dimension_overflow() {
        assert!(Frame::from_rgb(vec![], u32::MAX, u32::MAX).is_none());
    }
}
