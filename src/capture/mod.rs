//! Camera sources.
//!
//! Two physically different capture backends sit behind the `CameraSource`
//! trait: the onboard CSI camera module and generic USB video devices. The
//! variant is chosen once at construction; the frame loop never branches on
//! camera type.
//!
//! Device references starting with `stub://` select a synthetic in-memory
//! backend (used by tests and featureless builds); real V4L2 capture is
//! behind the `capture-v4l2` feature.
//!
//! State machine: `Closed -> Opening -> Open`, with `Faulted` entered on a
//! failed read. A successful retry returns to `Open`; escalation to a fatal
//! error closes the source. Only `Open` and `Faulted` permit `read_frame`.

mod onboard;
mod synthetic;
mod usb;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

pub use onboard::OnboardCamera;
pub use usb::UsbCamera;

use std::str::FromStr;

use thiserror::Error;

use crate::frame::Frame;

/// Capture failure taxonomy.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device cannot be claimed (absent, busy). Fatal at startup.
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// One dropped or corrupt read. The loop retries a bounded number of
    /// times before escalating.
    #[error("transient capture failure: {0}")]
    Transient(String),
    /// The source is gone; terminates the loop.
    #[error("fatal capture failure: {0}")]
    Fatal(String),
}

/// Camera lifecycle state, observable for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceState {
    Closed,
    Opening,
    Open,
    Faulted,
}

/// Which physical backend to construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraKind {
    #[default]
    Onboard,
    Usb,
}

impl FromStr for CameraKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onboard" => Ok(CameraKind::Onboard),
            "usb" => Ok(CameraKind::Usb),
            other => Err(format!("unknown camera type '{}'", other)),
        }
    }
}

/// Frame capture capability set.
pub trait CameraSource {
    /// Stable device reference for logs (`/dev/video1`, `stub://cam`).
    fn device(&self) -> &str;

    /// Claim the physical device. Fatal at startup on failure.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Capture the next frame. Permitted in `Open` and, for retries, in
    /// `Faulted`.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device. Idempotent; safe even when `open` never
    /// succeeded.
    fn close(&mut self);

    fn state(&self) -> SourceState;
}

/// Capture parameters shared by both variants.
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            target_fps: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_kind_parses() {
        assert_eq!("onboard".parse::<CameraKind>().unwrap(), CameraKind::Onboard);
        assert_eq!("USB".parse::<CameraKind>().unwrap(), CameraKind::Usb);
        assert!("webcam".parse::<CameraKind>().is_err());
    }
}
