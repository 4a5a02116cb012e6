//! Onboard CSI camera module.
//!
//! The sensor needs a settling period after stream-on (auto-exposure and
//! focus converge over the first frames), so `open` captures and discards a
//! few warm-up frames before the source reports `Open`.

use crate::capture::synthetic::SyntheticSource;
use crate::capture::{CameraSource, CaptureError, CaptureSettings, SourceState};
use crate::frame::Frame;

const WARMUP_FRAMES: u32 = 3;

enum Backend {
    Synthetic(Option<SyntheticSource>),
    #[cfg(feature = "capture-v4l2")]
    V4l2(Option<crate::capture::v4l2::V4lHandle>),
    #[cfg(not(feature = "capture-v4l2"))]
    Unsupported,
}

pub struct OnboardCamera {
    device: String,
    settings: CaptureSettings,
    state: SourceState,
    backend: Backend,
}

impl OnboardCamera {
    pub fn new(device: impl Into<String>, settings: CaptureSettings) -> Self {
        let device = device.into();
        let backend = if device.starts_with("stub://") {
            Backend::Synthetic(None)
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                Backend::V4l2(None)
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                Backend::Unsupported
            }
        };
        Self {
            device,
            settings,
            state: SourceState::Closed,
            backend,
        }
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        match &mut self.backend {
            Backend::Synthetic(source) => source
                .as_mut()
                .ok_or_else(|| CaptureError::Fatal("read on unopened camera".into()))?
                .next_frame(),
            #[cfg(feature = "capture-v4l2")]
            Backend::V4l2(handle) => handle
                .as_mut()
                .ok_or_else(|| CaptureError::Fatal("read on unopened camera".into()))?
                .read_frame(),
            #[cfg(not(feature = "capture-v4l2"))]
            Backend::Unsupported => Err(CaptureError::Fatal("no capture backend".into())),
        }
    }
}

impl CameraSource for OnboardCamera {
    fn device(&self) -> &str {
        &self.device
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        if self.state == SourceState::Open {
            return Ok(());
        }
        self.state = SourceState::Opening;
        match &mut self.backend {
            Backend::Synthetic(source) => {
                *source = Some(SyntheticSource::new(self.settings.clone()));
                log::info!("onboard camera connected to {} (synthetic)", self.device);
            }
            #[cfg(feature = "capture-v4l2")]
            Backend::V4l2(handle) => {
                match crate::capture::v4l2::V4lHandle::open(&self.device, &self.settings, false) {
                    Ok(opened) => *handle = Some(opened),
                    Err(err) => {
                        self.state = SourceState::Closed;
                        return Err(err);
                    }
                }
            }
            #[cfg(not(feature = "capture-v4l2"))]
            Backend::Unsupported => {
                self.state = SourceState::Closed;
                return Err(CaptureError::Unavailable(format!(
                    "{}: built without the capture-v4l2 feature",
                    self.device
                )));
            }
        }

        // Sensor settling: capture and discard the first frames.
        for _ in 0..WARMUP_FRAMES {
            if let Err(err) = self.capture() {
                log::debug!("warm-up read on {}: {}", self.device, err);
            }
        }
        self.state = SourceState::Open;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        match self.state {
            SourceState::Open | SourceState::Faulted => {}
            other => {
                return Err(CaptureError::Fatal(format!(
                    "read_frame in state {other:?}"
                )))
            }
        }
        match self.capture() {
            Ok(frame) => {
                self.state = SourceState::Open;
                Ok(frame)
            }
            Err(err) => {
                self.state = SourceState::Faulted;
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        match &mut self.backend {
            Backend::Synthetic(source) => *source = None,
            #[cfg(feature = "capture-v4l2")]
            Backend::V4l2(handle) => *handle = None,
            #[cfg(not(feature = "capture-v4l2"))]
            Backend::Unsupported => {}
        }
        self.state = SourceState::Closed;
    }

    fn state(&self) -> SourceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_camera() -> OnboardCamera {
        OnboardCamera::new("stub://onboard", CaptureSettings::default())
    }

    #[test]
    fn lifecycle_states() {
        let mut cam = stub_camera();
        assert_eq!(cam.state(), SourceState::Closed);
        cam.open().unwrap();
        assert_eq!(cam.state(), SourceState::Open);
        let frame = cam.read_frame().unwrap();
        assert_eq!(frame.width, 640);
        cam.close();
        assert_eq!(cam.state(), SourceState::Closed);
    }

    #[test]
    fn read_before_open_is_fatal() {
        let mut cam = stub_camera();
        let err = cam.read_frame().unwrap_err();
        assert!(matches!(err, CaptureError::Fatal(_)));
    }

    #[test]
    fn close_without_open_is_safe_and_idempotent() {
        let mut cam = stub_camera();
        cam.close();
        cam.close();
        assert_eq!(cam.state(), SourceState::Closed);
    }
}
