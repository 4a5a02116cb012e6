//! sightline
//!
//! Continuous object detection for single-board computers with a small
//! status display. One synchronous loop drives the whole appliance:
//!
//! 1. A camera source (onboard CSI module or USB/V4L2 device) yields frames.
//! 2. A detector runs neural inference and suppresses overlapping boxes.
//! 3. The ranker localizes and formats the top detections for the display.
//! 4. A renderer paints either a 2x16 character LCD or a 128x64 OLED panel.
//!
//! # Module Structure
//!
//! - `capture`: camera sources behind one trait (onboard, USB, synthetic)
//! - `detect`: detector backends, detection set post-processing, NMS
//! - `rank`: localized line formatting under display width budgets
//! - `display`: character and pixel renderers over opaque panel drivers
//! - `fps`: smoothed frame-rate estimation
//! - `pipeline`: the frame loop and the device lifecycle
//! - `config`: resolved appliance configuration (file + env)
//! - `labels`: static class-id to localized-label table
//!
//! Hardware access is feature-gated (`capture-v4l2`, `backend-tract`,
//! `hw-i2c`); every component has a synthetic or stub counterpart so the
//! full pipeline is exercisable on a development host.

pub mod capture;
pub mod config;
pub mod detect;
pub mod display;
pub mod fps;
pub mod frame;
pub mod labels;
pub mod pipeline;
pub mod rank;

pub use capture::{
    CameraKind, CameraSource, CaptureError, CaptureSettings, OnboardCamera, SourceState, UsbCamera,
};
pub use config::{AppConfig, ConfigError, DisplayKind};
pub use detect::{
    Detection, DetectionSet, Detector, DetectorBackend, InferenceError, ModelLoadError, StubBackend,
};
pub use display::{AssetLoadError, DisplayError, DisplayGeometry, DisplayRenderer};
pub use fps::FpsEstimator;
pub use frame::Frame;
pub use labels::Locale;
pub use pipeline::Pipeline;
pub use rank::{rank, RankedLine};
