//! Status display rendering.
//!
//! Two renderer variants sit behind one trait: a 2x16 character LCD and a
//! 128x64 pixel OLED panel. The wire protocol is an opaque driver concern
//! (`CharPanelDriver` / `PixelPanelDriver`); recording stub drivers are
//! always available and the real I2C drivers live behind the `hw-i2c`
//! feature.
//!
//! The renderer layer is responsible for:
//! - Turning ranked lines plus the frame-rate estimate into a screen layout
//! - Skipping redraws when the pixel panel content is unchanged
//! - Blanking the panel at shutdown
//!
//! A single failed render surfaces as `DisplayError::Transient`; the frame
//! loop retries once and then skips the cycle's visual update.

mod char_lcd;
pub mod driver;
#[cfg(feature = "hw-i2c")]
pub mod i2c;
mod oled;

pub use char_lcd::CharacterDisplay;
pub use driver::{CharPanelDriver, PixelPanelDriver, StubCharPanel, StubPixelPanel};
pub use oled::{GraphicalDisplay, OledFonts};

use thiserror::Error;

use crate::rank::RankedLine;

/// Per-render failure. The loop never treats this as fatal.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("transient display write failure: {0}")]
    Transient(String),
}

/// Fatal at startup: a display asset (font file) is missing or unusable.
#[derive(Debug, Error)]
#[error("failed to load display asset '{asset}': {reason}")]
pub struct AssetLoadError {
    pub asset: String,
    pub reason: String,
}

/// Addressable layout of the target display. The ranker uses this to fit
/// text into per-slot budgets before the renderer ever sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayGeometry {
    /// Fixed character grid (rows x cols).
    Character { cols: usize, rows: usize },
    /// Pixel panel with a large font for the first slot and a small font
    /// for the rest.
    Pixel {
        width: u32,
        height: u32,
        font_large_px: u32,
        font_small_px: u32,
    },
}

impl DisplayGeometry {
    /// Number of detection slots this geometry can show.
    pub fn label_slots(&self) -> usize {
        match self {
            DisplayGeometry::Character { rows, .. } => (*rows).min(2),
            DisplayGeometry::Pixel { .. } => 3,
        }
    }

    /// Whether `text` fits the addressable width of `slot`.
    ///
    /// Character grids count characters. Pixel panels use a conservative
    /// per-character advance estimate (full square for CJK, ~60% for
    /// ASCII); the renderer additionally clips at paint time, so the
    /// estimate only has to be safe, not exact.
    pub fn line_fits(&self, slot: usize, text: &str) -> bool {
        match self {
            DisplayGeometry::Character { cols, .. } => text.chars().count() <= *cols,
            DisplayGeometry::Pixel {
                width,
                font_large_px,
                font_small_px,
                ..
            } => {
                let font_px = if slot == 0 {
                    *font_large_px
                } else {
                    *font_small_px
                };
                estimate_text_px(text, font_px) <= *width
            }
        }
    }
}

fn estimate_text_px(text: &str, font_px: u32) -> u32 {
    text.chars()
        .map(|c| {
            if c.is_ascii() {
                font_px.saturating_mul(3) / 5
            } else {
                font_px
            }
        })
        .sum()
}

/// Rendering capability set over one physical display.
///
/// `open` acquires the device (and applies one-time settings such as
/// contrast); `close` is idempotent and safe to call even when `open`
/// never succeeded.
pub trait DisplayRenderer {
    fn geometry(&self) -> DisplayGeometry;

    fn open(&mut self) -> Result<(), DisplayError>;

    /// Paint one cycle's ranked lines plus the frame-rate readout.
    fn render(&mut self, lines: &[RankedLine], fps: f64) -> Result<(), DisplayError>;

    /// Clear the panel. Used on teardown; also resets any redraw state.
    fn blank(&mut self) -> Result<(), DisplayError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_geometry_counts_chars_not_bytes() {
        let geom = DisplayGeometry::Character { cols: 16, rows: 2 };
        assert!(geom.line_fits(0, "人 95%"));
        assert!(geom.line_fits(0, "0123456789abcdef"));
        assert!(!geom.line_fits(0, "0123456789abcdefg"));
    }

    #[test]
    fn pixel_geometry_budget_depends_on_slot_font() {
        let geom = DisplayGeometry::Pixel {
            width: 128,
            height: 64,
            font_large_px: 18,
            font_small_px: 14,
        };
        // 12 ASCII chars: 12*10=120px in the large font, 12*8=96px small.
        assert!(geom.line_fits(1, "abcdefghijkl"));
        assert!(geom.line_fits(0, "abcdefghijkl"));
        // 8 CJK chars: 144px large, 112px small.
        assert!(!geom.line_fits(0, "検出検出検出検出"));
        assert!(geom.line_fits(1, "検出検出検出検出"));
    }

    #[test]
    fn label_slot_counts() {
        assert_eq!(DisplayGeometry::Character { cols: 16, rows: 2 }.label_slots(), 2);
        let pixel = DisplayGeometry::Pixel {
            width: 128,
            height: 64,
            font_large_px: 18,
            font_small_px: 14,
        };
        assert_eq!(pixel.label_slots(), 3);
    }
}
