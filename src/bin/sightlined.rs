//! sightlined: continuous object detection with a small status display.
//!
//! Wires configuration to concrete components (camera variant, detector
//! backend, display renderer) and hands them to the frame loop. SIGINT and
//! SIGTERM request a clean shutdown; the loop blanks and releases both
//! devices before the process exits.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sightline::capture::{CameraKind, CameraSource, OnboardCamera, UsbCamera};
use sightline::config::{AppConfig, DisplayConfig, DisplayKind};
use sightline::detect::Detector;
use sightline::display::{
    CharPanelDriver, CharacterDisplay, DisplayRenderer, GraphicalDisplay, OledFonts,
    PixelPanelDriver,
};
use sightline::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "sightlined",
    version,
    about = "Camera object detection to a small I2C display"
)]
struct Cli {
    /// Camera variant to drive.
    #[arg(long = "camera-type", value_name = "onboard|usb")]
    camera_type: Option<CameraKind>,

    /// V4L2 device index for the usb camera type.
    #[arg(long, value_name = "INDEX")]
    device: Option<u32>,

    /// TOML configuration file (falls back to SIGHTLINE_CONFIG).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("load configuration")?;
    if let Some(kind) = cli.camera_type {
        config.capture.camera = kind;
    }
    if let Some(index) = cli.device {
        config.capture.device_index = index;
    }
    log::info!(
        "configured: {:?} camera at {} ({}x{} @ {} fps), {:?} display at {:#04x} on i2c-{}",
        config.capture.camera,
        config.capture.resolved_device(),
        config.capture.settings.width,
        config.capture.settings.height,
        config.capture.settings.target_fps,
        config.display.kind,
        config.display.i2c_address,
        config.display.i2c_bus,
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::SeqCst);
        })
        .context("install signal handler")?;
    }

    let camera = build_camera(&config);
    let detector = build_detector(&config)?;
    let display = build_display(&config)?;

    let mut pipeline = Pipeline::new(
        camera,
        detector,
        display,
        config.capture.settings.target_fps,
        config.max_labels,
        config.locale,
    );
    pipeline.run(&cancel)
}

fn build_camera(config: &AppConfig) -> Box<dyn CameraSource> {
    let device = config.capture.resolved_device();
    let settings = config.capture.settings.clone();
    match config.capture.camera {
        CameraKind::Onboard => Box::new(OnboardCamera::new(device, settings)),
        CameraKind::Usb => Box::new(UsbCamera::with_device(
            config.capture.device_index,
            device,
            settings,
        )),
    }
}

#[cfg(feature = "backend-tract")]
fn build_detector(config: &AppConfig) -> anyhow::Result<Detector> {
    let m = &config.model;
    log::info!("loading model {}", m.path.display());
    Detector::initialize(
        &m.path,
        m.input_width,
        m.input_height,
        m.confidence_threshold,
        m.iou_threshold,
    )
    .context("load detection model")
}

#[cfg(not(feature = "backend-tract"))]
fn build_detector(config: &AppConfig) -> anyhow::Result<Detector> {
    use sightline::detect::StubBackend;

    log::warn!("built without the backend-tract feature; running a quiet stub backend");
    Ok(Detector::new(
        Box::new(StubBackend::quiet()),
        config.model.confidence_threshold,
        config.model.iou_threshold,
    ))
}

fn build_display(config: &AppConfig) -> anyhow::Result<Box<dyn DisplayRenderer>> {
    let d = &config.display;
    match d.kind {
        DisplayKind::Character => Ok(Box::new(CharacterDisplay::new(
            char_driver(d),
            d.cols,
            d.rows,
            config.locale,
        ))),
        DisplayKind::Graphical => {
            let fonts = match &d.font_path {
                Some(path) => {
                    OledFonts::load(path, d.font_large_px as f32, d.font_small_px as f32)
                        .context("load display font")?
                }
                None => {
                    log::warn!("no display font configured; using the builtin ASCII face");
                    OledFonts::builtin()
                }
            };
            Ok(Box::new(GraphicalDisplay::new(
                pixel_driver(d),
                d.width,
                d.height,
                fonts,
                d.font_large_px,
                d.font_small_px,
                d.contrast,
                config.locale,
            )))
        }
    }
}

#[cfg(feature = "hw-i2c")]
fn char_driver(d: &DisplayConfig) -> Box<dyn CharPanelDriver> {
    Box::new(sightline::display::i2c::Hd44780Driver::new(
        d.i2c_bus,
        d.i2c_address,
    ))
}

#[cfg(not(feature = "hw-i2c"))]
fn char_driver(d: &DisplayConfig) -> Box<dyn CharPanelDriver> {
    use sightline::display::StubCharPanel;

    log::warn!("built without the hw-i2c feature; display writes go to a stub panel");
    Box::new(StubCharPanel::new(d.rows))
}

#[cfg(feature = "hw-i2c")]
fn pixel_driver(d: &DisplayConfig) -> Box<dyn PixelPanelDriver> {
    Box::new(sightline::display::i2c::Ssd1306Driver::new(
        d.i2c_bus,
        d.i2c_address,
        d.width,
        d.height,
    ))
}

#[cfg(not(feature = "hw-i2c"))]
fn pixel_driver(_d: &DisplayConfig) -> Box<dyn PixelPanelDriver> {
    use sightline::display::StubPixelPanel;

    log::warn!("built without the hw-i2c feature; display writes go to a stub panel");
    Box::new(StubPixelPanel::new())
}
