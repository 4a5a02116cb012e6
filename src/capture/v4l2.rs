#![cfg(feature = "capture-v4l2")]

//! Shared V4L2 plumbing for the onboard and USB variants.
//!
//! The mmap stream mutably borrows the device, so the pair lives in a
//! self-referencing cell. Both camera variants negotiate RGB3 frames; a
//! device that cannot deliver the packed-RGB length for the negotiated
//! geometry fails each read as transient.

use ouroboros::self_referencing;

use crate::capture::{CaptureError, CaptureSettings};
use crate::frame::Frame;

#[self_referencing]
struct StreamCell {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

pub struct V4lHandle {
    cell: StreamCell,
    width: u32,
    height: u32,
}

impl V4lHandle {
    /// Claim the device node and start streaming.
    ///
    /// `apply_fps` selects whether capture parameters are negotiated (UVC
    /// devices honor this; CSI pipelines are paced by the sensor mode).
    pub fn open(path: &str, settings: &CaptureSettings, apply_fps: bool) -> Result<Self, CaptureError> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(path)
            .map_err(|e| CaptureError::Unavailable(format!("open {path}: {e}")))?;

        let mut format = device
            .format()
            .map_err(|e| CaptureError::Unavailable(format!("read format on {path}: {e}")))?;
        format.width = settings.width;
        format.height = settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("{path}: failed to set format: {err}");
                device
                    .format()
                    .map_err(|e| CaptureError::Unavailable(format!("re-read format: {e}")))?
            }
        };
        if &format.fourcc.repr != b"RGB3" {
            return Err(CaptureError::Unavailable(format!(
                "{path}: device cannot deliver RGB3 (got {})",
                format.fourcc
            )));
        }

        if apply_fps && settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("{path}: failed to set frame rate: {err}");
            }
        }

        log::info!(
            "{path}: streaming {}x{} {}",
            format.width,
            format.height,
            format.fourcc
        );

        let cell = StreamCellBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
            },
        }
        .try_build()
        .map_err(|e| CaptureError::Unavailable(format!("create capture stream on {path}: {e}")))?;

        Ok(Self {
            cell,
            width: format.width,
            height: format.height,
        })
    }

    pub fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let (buf, _meta) = self
            .cell
            .with_mut(|fields| fields.stream.next())
            .map_err(|e| CaptureError::Transient(format!("dequeue buffer: {e}")))?;

        Frame::from_rgb(buf.to_vec(), self.width, self.height)
            .ok_or_else(|| CaptureError::Transient("short or padded capture buffer".into()))
    }

    pub fn active_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
