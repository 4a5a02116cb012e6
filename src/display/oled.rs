//! 128x64 OLED renderer.
//!
//! Up to three ranked lines stacked vertically, the first in the large font,
//! the rest in the small font, with the frame-rate readout in a fixed
//! top-right region. The renderer keeps the last flushed framebuffer and
//! skips the bus transfer when a cycle produces byte-identical content;
//! a redraw is always forced on the first render after (re-)open.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};

use crate::display::driver::PixelPanelDriver;
use crate::display::{AssetLoadError, DisplayError, DisplayGeometry, DisplayRenderer};
use crate::labels::{self, Locale};
use crate::rank::RankedLine;

/// X offset of the frame-rate readout region.
const FPS_CORNER_X: u32 = 80;
/// First detection line starts below the readout row.
const FIRST_LINE_Y: u32 = 16;
/// Lines closer than this to the bottom edge are not drawn.
const BOTTOM_MARGIN: u32 = 12;

#[derive(Clone, Copy)]
enum FontSlot {
    Large,
    Small,
}

/// Font assets for the pixel panel.
///
/// `load` reads a TrueType/OpenType file once at startup; a missing or
/// unusable file is fatal. `builtin` is a compiled-in 5x7 ASCII face for
/// hosts without font assets (tests, bring-up); it cannot render CJK
/// labels, so production ja-locale deployments want a real font file.
pub enum OledFonts {
    Glyph {
        font: FontVec,
        large: PxScale,
        small: PxScale,
    },
    Builtin,
}

impl OledFonts {
    pub fn load(path: &Path, large_px: f32, small_px: f32) -> Result<Self, AssetLoadError> {
        let asset = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| AssetLoadError {
            asset: asset.clone(),
            reason: format!("read: {e}"),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| AssetLoadError {
            asset,
            reason: format!("parse: {e}"),
        })?;
        Ok(Self::Glyph {
            font,
            large: PxScale::from(large_px),
            small: PxScale::from(small_px),
        })
    }

    pub fn builtin() -> Self {
        Self::Builtin
    }

    fn draw(&self, fb: &mut Framebuffer, x: u32, y: u32, text: &str, slot: FontSlot) {
        match self {
            Self::Glyph { font, large, small } => {
                let scale = match slot {
                    FontSlot::Large => *large,
                    FontSlot::Small => *small,
                };
                draw_glyph_text(fb, font, scale, x, y, text);
            }
            Self::Builtin => {
                let scale = match slot {
                    FontSlot::Large => 2,
                    FontSlot::Small => 1,
                };
                draw_builtin_text(fb, scale, x, y, text);
            }
        }
    }
}

pub struct GraphicalDisplay {
    driver: Box<dyn PixelPanelDriver>,
    width: u32,
    height: u32,
    fonts: OledFonts,
    font_large_px: u32,
    font_small_px: u32,
    contrast: u8,
    locale: Locale,
    /// Last flushed framebuffer; `None` until the first flush after open.
    shown: Option<Vec<u8>>,
    force_redraw: bool,
    open: bool,
}

impl GraphicalDisplay {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver: Box<dyn PixelPanelDriver>,
        width: u32,
        height: u32,
        fonts: OledFonts,
        font_large_px: u32,
        font_small_px: u32,
        contrast: u8,
        locale: Locale,
    ) -> Self {
        Self {
            driver,
            width,
            height,
            fonts,
            font_large_px,
            font_small_px,
            contrast,
            locale,
            shown: None,
            force_redraw: true,
            open: false,
        }
    }

    fn compose(&self, lines: &[RankedLine], fps: f64) -> Vec<u8> {
        let mut fb = Framebuffer::new(self.width, self.height);

        self.fonts
            .draw(&mut fb, FPS_CORNER_X, 0, &format!("FPS:{fps:.1}"), FontSlot::Small);

        if lines.is_empty() {
            self.fonts
                .draw(&mut fb, 20, 28, labels::idle_text(self.locale), FontSlot::Large);
            return fb.bytes;
        }

        let mut y = FIRST_LINE_Y;
        for line in lines {
            if y >= self.height.saturating_sub(BOTTOM_MARGIN) {
                break;
            }
            let slot = if line.slot == 0 {
                FontSlot::Large
            } else {
                FontSlot::Small
            };
            self.fonts.draw(&mut fb, 0, y, &line.text, slot);
            y += if line.slot == 0 {
                self.font_large_px + 2
            } else {
                self.font_small_px + 2
            };
        }
        fb.bytes
    }

    fn flush_if_changed(&mut self, buffer: Vec<u8>) -> Result<(), DisplayError> {
        if !self.force_redraw && self.shown.as_deref() == Some(buffer.as_slice()) {
            return Ok(());
        }
        self.driver.flush(&buffer)?;
        self.shown = Some(buffer);
        self.force_redraw = false;
        Ok(())
    }
}

impl DisplayRenderer for GraphicalDisplay {
    fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry::Pixel {
            width: self.width,
            height: self.height,
            font_large_px: self.font_large_px,
            font_small_px: self.font_small_px,
        }
    }

    fn open(&mut self) -> Result<(), DisplayError> {
        self.driver.power_on()?;
        // Applied once per acquisition, not per frame.
        self.driver.set_contrast(self.contrast)?;
        self.shown = None;
        self.force_redraw = true;
        self.open = true;
        Ok(())
    }

    fn render(&mut self, lines: &[RankedLine], fps: f64) -> Result<(), DisplayError> {
        let buffer = self.compose(lines, fps);
        self.flush_if_changed(buffer)
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        let buffer = vec![0u8; Framebuffer::len(self.width, self.height)];
        self.driver.flush(&buffer)?;
        self.shown = None;
        self.force_redraw = true;
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.driver.power_off();
            self.open = false;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ----------------------------------------------------------------------------
// 1bpp framebuffer (SSD1306 page-major layout)
// ----------------------------------------------------------------------------

struct Framebuffer {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            bytes: vec![0u8; Self::len(width, height)],
            width,
            height,
        }
    }

    fn len(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize).div_ceil(8)
    }

    /// Set one pixel; out-of-panel coordinates are clipped.
    fn set(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = (y as usize / 8) * self.width as usize + x as usize;
        self.bytes[idx] |= 1 << (y as usize % 8);
    }
}

fn draw_glyph_text(fb: &mut Framebuffer, font: &FontVec, scale: PxScale, x: u32, y: u32, text: &str) {
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let mut caret = x as f32;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(caret, y as f32 + ascent));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                if coverage > 0.5 {
                    fb.set(bounds.min.x as i32 + gx as i32, bounds.min.y as i32 + gy as i32);
                }
            });
        }
        caret += scaled.h_advance(id);
    }
}

// ----------------------------------------------------------------------------
// Builtin 5x7 face
// ----------------------------------------------------------------------------

/// Column bitmaps (LSB = top row) for the characters the readouts use.
/// Unknown characters render as a filled box.
fn builtin_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00],
        '0' => [0x3e, 0x51, 0x49, 0x45, 0x3e],
        '1' => [0x00, 0x42, 0x7f, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4b, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7f, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3c, 0x4a, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1e],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        '%' => [0x62, 0x64, 0x08, 0x13, 0x23],
        '-' => [0x08, 0x08, 0x08, 0x08, 0x08],
        'A' => [0x7e, 0x11, 0x11, 0x11, 0x7e],
        'B' => [0x7f, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3e, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7f, 0x41, 0x41, 0x22, 0x1c],
        'E' => [0x7f, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7f, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3e, 0x41, 0x49, 0x49, 0x7a],
        'H' => [0x7f, 0x08, 0x08, 0x08, 0x7f],
        'I' => [0x00, 0x41, 0x7f, 0x41, 0x00],
        'J' => [0x20, 0x40, 0x41, 0x3f, 0x01],
        'K' => [0x7f, 0x08, 0x14, 0x22, 0x41],
        'L' => [0x7f, 0x40, 0x40, 0x40, 0x40],
        'M' => [0x7f, 0x02, 0x0c, 0x02, 0x7f],
        'N' => [0x7f, 0x04, 0x08, 0x10, 0x7f],
        'O' => [0x3e, 0x41, 0x41, 0x41, 0x3e],
        'P' => [0x7f, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3e, 0x41, 0x51, 0x21, 0x5e],
        'R' => [0x7f, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7f, 0x01, 0x01],
        'U' => [0x3f, 0x40, 0x40, 0x40, 0x3f],
        'V' => [0x1f, 0x20, 0x40, 0x20, 0x1f],
        'W' => [0x3f, 0x40, 0x38, 0x40, 0x3f],
        'X' => [0x63, 0x14, 0x08, 0x14, 0x63],
        'Y' => [0x07, 0x08, 0x70, 0x08, 0x07],
        'Z' => [0x61, 0x51, 0x49, 0x45, 0x43],
        _ => [0x7f, 0x7f, 0x7f, 0x7f, 0x7f],
    }
}

fn draw_builtin_text(fb: &mut Framebuffer, scale: u32, x: u32, y: u32, text: &str) {
    let mut caret = x;
    for c in text.chars() {
        let glyph = builtin_glyph(c);
        for (col, bits) in glyph.iter().enumerate() {
            for row in 0..7u32 {
                if bits & (1 << row) != 0 {
                    for sx in 0..scale {
                        for sy in 0..scale {
                            fb.set(
                                (caret + col as u32 * scale + sx) as i32,
                                (y + row * scale + sy) as i32,
                            );
                        }
                    }
                }
            }
        }
        caret += 6 * scale;
    }
}
