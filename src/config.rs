//! Resolved appliance configuration.
//!
//! Sources, in override order: TOML file (path from `--config` or
//! `SIGHTLINE_CONFIG`), then environment variables, then the camera flags
//! on the command line. Everything is validated before any device opens;
//! an invalid value is fatal at startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::capture::{CameraKind, CaptureSettings};
use crate::labels::Locale;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 20;
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_MODEL_INPUT: u32 = 640;
const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_I2C_BUS: u8 = 1;
const DEFAULT_LCD_ADDRESS: u16 = 0x27;
const DEFAULT_OLED_ADDRESS: u16 = 0x3c;
const DEFAULT_LCD_COLS: usize = 16;
const DEFAULT_LCD_ROWS: usize = 2;
const DEFAULT_OLED_WIDTH: u32 = 128;
const DEFAULT_OLED_HEIGHT: u32 = 64;
const DEFAULT_FONT_LARGE_PX: u32 = 18;
const DEFAULT_FONT_SMALL_PX: u32 = 14;
const DEFAULT_CONTRAST: u8 = 255;
const DEFAULT_MAX_LABELS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ----------------------------------------------------------------------------
// File schema (everything optional, defaults applied on resolve)
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    capture: Option<CaptureFile>,
    model: Option<ModelFile>,
    display: Option<DisplayFile>,
    output: Option<OutputFile>,
}

#[derive(Debug, Default, Deserialize)]
struct CaptureFile {
    camera: Option<String>,
    device_index: Option<u32>,
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelFile {
    path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayFile {
    kind: Option<String>,
    i2c_bus: Option<u8>,
    i2c_address: Option<u16>,
    cols: Option<usize>,
    rows: Option<usize>,
    width: Option<u32>,
    height: Option<u32>,
    font_path: Option<PathBuf>,
    font_large_px: Option<u32>,
    font_small_px: Option<u32>,
    contrast: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputFile {
    max_labels: Option<usize>,
    locale: Option<String>,
}

// ----------------------------------------------------------------------------
// Resolved configuration
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayKind {
    #[default]
    Character,
    Graphical,
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub camera: CameraKind,
    pub device_index: u32,
    /// Explicit device reference; `None` derives the node from the camera
    /// kind and index.
    pub device: Option<String>,
    pub settings: CaptureSettings,
}

impl CaptureConfig {
    /// The device reference the selected variant should open.
    pub fn resolved_device(&self) -> String {
        match &self.device {
            Some(device) => device.clone(),
            None => match self.camera {
                CameraKind::Onboard => "/dev/video0".to_string(),
                CameraKind::Usb => format!("/dev/video{}", self.device_index),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub kind: DisplayKind,
    pub i2c_bus: u8,
    pub i2c_address: u16,
    pub cols: usize,
    pub rows: usize,
    pub width: u32,
    pub height: u32,
    pub font_path: Option<PathBuf>,
    pub font_large_px: u32,
    pub font_small_px: u32,
    pub contrast: u8,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub model: ModelConfig,
    pub display: DisplayConfig,
    pub max_labels: usize,
    pub locale: Locale,
}

impl AppConfig {
    /// Load from the file named by `path` (or `SIGHTLINE_CONFIG`), apply
    /// environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var("SIGHTLINE_CONFIG").ok().map(PathBuf::from);
        let file = match path.or(env_path.as_deref()) {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::resolve(file)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        let capture_file = file.capture.unwrap_or_default();
        let camera = match capture_file.camera.as_deref() {
            Some(raw) => raw.parse::<CameraKind>().map_err(ConfigError::Invalid)?,
            None => CameraKind::default(),
        };
        let capture = CaptureConfig {
            camera,
            device_index: capture_file.device_index.unwrap_or(0),
            device: capture_file.device,
            settings: CaptureSettings {
                width: capture_file.width.unwrap_or(DEFAULT_WIDTH),
                height: capture_file.height.unwrap_or(DEFAULT_HEIGHT),
                target_fps: capture_file.target_fps.unwrap_or(DEFAULT_FPS),
            },
        };

        let model_file = file.model.unwrap_or_default();
        let model = ModelConfig {
            path: model_file
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            input_width: model_file.input_width.unwrap_or(DEFAULT_MODEL_INPUT),
            input_height: model_file.input_height.unwrap_or(DEFAULT_MODEL_INPUT),
            confidence_threshold: model_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONF_THRESHOLD),
            iou_threshold: model_file.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
        };

        let display_file = file.display.unwrap_or_default();
        let kind = match display_file.kind.as_deref() {
            None | Some("char") => DisplayKind::Character,
            Some("oled") => DisplayKind::Graphical,
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "unknown display kind '{other}' (expected 'char' or 'oled')"
                )))
            }
        };
        let display = DisplayConfig {
            kind,
            i2c_bus: display_file.i2c_bus.unwrap_or(DEFAULT_I2C_BUS),
            i2c_address: display_file.i2c_address.unwrap_or(match kind {
                DisplayKind::Character => DEFAULT_LCD_ADDRESS,
                DisplayKind::Graphical => DEFAULT_OLED_ADDRESS,
            }),
            cols: display_file.cols.unwrap_or(DEFAULT_LCD_COLS),
            rows: display_file.rows.unwrap_or(DEFAULT_LCD_ROWS),
            width: display_file.width.unwrap_or(DEFAULT_OLED_WIDTH),
            height: display_file.height.unwrap_or(DEFAULT_OLED_HEIGHT),
            font_path: display_file.font_path,
            font_large_px: display_file.font_large_px.unwrap_or(DEFAULT_FONT_LARGE_PX),
            font_small_px: display_file.font_small_px.unwrap_or(DEFAULT_FONT_SMALL_PX),
            contrast: display_file.contrast.unwrap_or(DEFAULT_CONTRAST),
        };

        let output = file.output.unwrap_or_default();
        let locale = match output.locale.as_deref() {
            Some(raw) => raw.parse::<Locale>().map_err(ConfigError::Invalid)?,
            None => Locale::Ja,
        };

        Ok(Self {
            capture,
            model,
            display,
            max_labels: output.max_labels.unwrap_or(DEFAULT_MAX_LABELS),
            locale,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(camera) = std::env::var("SIGHTLINE_CAMERA") {
            if !camera.trim().is_empty() {
                self.capture.camera = camera.parse().map_err(ConfigError::Invalid)?;
            }
        }
        if let Ok(index) = std::env::var("SIGHTLINE_DEVICE_INDEX") {
            if !index.trim().is_empty() {
                self.capture.device_index = index.trim().parse().map_err(|_| {
                    ConfigError::Invalid("SIGHTLINE_DEVICE_INDEX must be an integer".into())
                })?;
            }
        }
        if let Ok(model) = std::env::var("SIGHTLINE_MODEL_PATH") {
            if !model.trim().is_empty() {
                self.model.path = PathBuf::from(model);
            }
        }
        if let Ok(locale) = std::env::var("SIGHTLINE_LOCALE") {
            if !locale.trim().is_empty() {
                self.locale = locale.parse().map_err(ConfigError::Invalid)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let s = &self.capture.settings;
        if s.width == 0 || s.height == 0 {
            return invalid(format!("capture size {}x{} is empty", s.width, s.height));
        }
        if s.target_fps == 0 {
            return invalid("target_fps must be greater than zero".into());
        }

        let m = &self.model;
        if m.input_width == 0 || m.input_height == 0 {
            return invalid("model input size is empty".into());
        }
        for (name, value) in [
            ("confidence_threshold", m.confidence_threshold),
            ("iou_threshold", m.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} {value} outside [0, 1]"));
            }
        }

        let d = &self.display;
        // 7-bit I2C address space, reserved ranges excluded.
        if !(0x03..=0x77).contains(&d.i2c_address) {
            return invalid(format!("i2c address {:#04x} out of range", d.i2c_address));
        }
        match d.kind {
            DisplayKind::Character => {
                if d.cols == 0 || d.rows == 0 {
                    return invalid(format!("character geometry {}x{} is empty", d.cols, d.rows));
                }
            }
            DisplayKind::Graphical => {
                if d.width == 0 || d.height == 0 {
                    return invalid(format!("pixel geometry {}x{} is empty", d.width, d.height));
                }
                if d.font_large_px == 0 || d.font_small_px == 0 {
                    return invalid("font sizes must be greater than zero".into());
                }
            }
        }

        if self.max_labels == 0 {
            return invalid("max_labels must be at least 1".into());
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_resolve_without_a_file() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg.capture.camera, CameraKind::Onboard);
        assert_eq!(cfg.capture.resolved_device(), "/dev/video0");
        assert_eq!(cfg.display.kind, DisplayKind::Character);
        assert_eq!(cfg.max_labels, 2);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
            [capture]
            camera = "usb"
            device_index = 1

            [display]
            kind = "oled"
            i2c_address = 0x3d

            [output]
            max_labels = 3
            locale = "en"
            "#,
        );
        let cfg = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.capture.camera, CameraKind::Usb);
        assert_eq!(cfg.capture.resolved_device(), "/dev/video1");
        assert_eq!(cfg.display.kind, DisplayKind::Graphical);
        assert_eq!(cfg.display.i2c_address, 0x3d);
        assert_eq!(cfg.max_labels, 3);
        assert_eq!(cfg.locale, Locale::En);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let file = write_config("[model]\nconfidence_threshold = 1.5\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn bad_i2c_address_is_rejected() {
        let file = write_config("[display]\ni2c_address = 0x80\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let file = write_config("not = [toml");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let file = write_config("[display]\nkind = \"char\"\ncols = 0\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }
}
