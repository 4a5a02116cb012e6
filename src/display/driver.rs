//! Opaque panel drivers.
//!
//! The renderers never touch wire bytes; they talk to one of these traits.
//! Recording stub drivers are always available (tests, development hosts);
//! the real I2C drivers live in `display::i2c` behind the `hw-i2c` feature.

use std::sync::{Arc, Mutex};

use crate::display::DisplayError;

/// Row-addressed text panel (HD44780-class character LCD).
pub trait CharPanelDriver {
    fn power_on(&mut self) -> Result<(), DisplayError>;

    /// Overwrite one full row. `text` is already padded to the row width.
    fn write_row(&mut self, row: usize, text: &str) -> Result<(), DisplayError>;

    fn clear(&mut self) -> Result<(), DisplayError>;

    fn power_off(&mut self);
}

/// Buffer-addressed monochrome pixel panel (SSD1306-class OLED).
pub trait PixelPanelDriver {
    fn power_on(&mut self) -> Result<(), DisplayError>;

    /// One-time brightness setting, applied after device acquisition.
    fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Transfer a full 1bpp framebuffer (page-major, width * height / 8
    /// bytes).
    fn flush(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    fn power_off(&mut self);
}

// ----------------------------------------------------------------------------
// Recording stubs
// ----------------------------------------------------------------------------

/// Everything a stub driver observed, shared with the test that owns it.
#[derive(Debug, Default)]
pub struct PanelLog {
    pub powered: bool,
    pub rows: Vec<String>,
    pub clears: u32,
    pub flushes: Vec<Vec<u8>>,
    pub contrast: Vec<u8>,
    /// When set, the next N writes fail with `DisplayError::Transient`.
    pub fail_next_writes: u32,
}

/// Stub character panel that records writes in a shared log.
#[derive(Clone, Default)]
pub struct StubCharPanel {
    pub log: Arc<Mutex<PanelLog>>,
}

impl StubCharPanel {
    pub fn new(rows: usize) -> Self {
        let panel = Self::default();
        panel.log.lock().unwrap().rows = vec![String::new(); rows];
        panel
    }

    fn take_failure(&self) -> bool {
        let mut log = self.log.lock().unwrap();
        if log.fail_next_writes > 0 {
            log.fail_next_writes -= 1;
            true
        } else {
            false
        }
    }
}

impl CharPanelDriver for StubCharPanel {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        self.log.lock().unwrap().powered = true;
        Ok(())
    }

    fn write_row(&mut self, row: usize, text: &str) -> Result<(), DisplayError> {
        if self.take_failure() {
            return Err(DisplayError::Transient("stub bus write failed".into()));
        }
        let mut log = self.log.lock().unwrap();
        if row >= log.rows.len() {
            return Err(DisplayError::Transient(format!("row {row} out of range")));
        }
        log.rows[row] = text.to_string();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        if self.take_failure() {
            return Err(DisplayError::Transient("stub bus write failed".into()));
        }
        let mut log = self.log.lock().unwrap();
        log.clears += 1;
        for row in &mut log.rows {
            row.clear();
        }
        Ok(())
    }

    fn power_off(&mut self) {
        self.log.lock().unwrap().powered = false;
    }
}

/// Stub pixel panel that records framebuffer transfers.
#[derive(Clone, Default)]
pub struct StubPixelPanel {
    pub log: Arc<Mutex<PanelLog>>,
}

impl StubPixelPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_failure(&self) -> bool {
        let mut log = self.log.lock().unwrap();
        if log.fail_next_writes > 0 {
            log.fail_next_writes -= 1;
            true
        } else {
            false
        }
    }
}

impl PixelPanelDriver for StubPixelPanel {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        self.log.lock().unwrap().powered = true;
        Ok(())
    }

    fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError> {
        self.log.lock().unwrap().contrast.push(level);
        Ok(())
    }

    fn flush(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        if self.take_failure() {
            return Err(DisplayError::Transient("stub bus write failed".into()));
        }
        self.log.lock().unwrap().flushes.push(buffer.to_vec());
        Ok(())
    }

    fn power_off(&mut self) {
        self.log.lock().unwrap().powered = false;
    }
}
