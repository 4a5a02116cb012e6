//! Generic USB (UVC) video device, addressed by V4L2 device index.

use crate::capture::synthetic::SyntheticSource;
use crate::capture::{CameraSource, CaptureError, CaptureSettings, SourceState};
use crate::frame::Frame;

enum Backend {
    Synthetic(Option<SyntheticSource>),
    #[cfg(feature = "capture-v4l2")]
    V4l2(Option<crate::capture::v4l2::V4lHandle>),
    #[cfg(not(feature = "capture-v4l2"))]
    Unsupported,
}

pub struct UsbCamera {
    device_index: u32,
    device: String,
    settings: CaptureSettings,
    state: SourceState,
    backend: Backend,
}

impl UsbCamera {
    /// A USB camera at `/dev/video{device_index}`.
    pub fn new(device_index: u32, settings: CaptureSettings) -> Self {
        Self::with_device(device_index, format!("/dev/video{device_index}"), settings)
    }

    /// A USB camera with an explicit device reference (`stub://` selects
    /// the synthetic backend).
    pub fn with_device(device_index: u32, device: String, settings: CaptureSettings) -> Self {
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
            device_index,
            device,
            settings,
            state: SourceState::Closed,
            backend,
        }
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl CameraSource for UsbCamera {
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
                log::info!(
                    "usb camera {} connected to {} (synthetic)",
                    self.device_index,
                    self.device
                );
            }
            #[cfg(feature = "capture-v4l2")]
            Backend::V4l2(handle) => {
                // UVC devices negotiate frame rate; log what we ended up with.
                match crate::capture::v4l2::V4lHandle::open(&self.device, &self.settings, true) {
                    Ok(opened) => {
                        let (w, h) = opened.active_size();
                        log::info!("usb camera {}: active {}x{}", self.device_index, w, h);
                        *handle = Some(opened);
                    }
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
        let result = match &mut self.backend {
            Backend::Synthetic(source) => source
                .as_mut()
                .ok_or_else(|| CaptureError::Fatal("read on unopened camera".into()))
                .and_then(SyntheticSource::next_frame),
            #[cfg(feature = "capture-v4l2")]
            Backend::V4l2(handle) => handle
                .as_mut()
                .ok_or_else(|| CaptureError::Fatal("read on unopened camera".into()))
                .and_then(crate::capture::v4l2::V4lHandle::read_frame),
            #[cfg(not(feature = "capture-v4l2"))]
            Backend::Unsupported => Err(CaptureError::Fatal("no capture backend".into())),
        };
        match result {
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

    #[test]
    fn requested_index_selects_the_device_node() {
        let cam = UsbCamera::new(1, CaptureSettings::default());
        assert_eq!(cam.device(), "/dev/video1");
        assert_eq!(cam.device_index(), 1);
    }

    #[test]
    fn stub_device_captures_frames() {
        let mut cam = UsbCamera::with_device(1, "stub://usb1".into(), CaptureSettings::default());
        cam.open().unwrap();
        assert_eq!(cam.state(), SourceState::Open);
        assert!(cam.read_frame().is_ok());
        cam.close();
        cam.close();
        assert_eq!(cam.state(), SourceState::Closed);
    }
}
