//! 2x16 character LCD renderer.
//!
//! The narrow geometry makes partial-redraw tracking pointless: every cycle
//! overwrites both rows in full. Row 1 carries the top ranked line (or the
//! idle text); row 2 carries the second ranked line when one exists,
//! otherwise the frame-rate readout.

use crate::display::driver::CharPanelDriver;
use crate::display::{DisplayError, DisplayGeometry, DisplayRenderer};
use crate::labels::{self, Locale};
use crate::rank::RankedLine;

pub struct CharacterDisplay {
    driver: Box<dyn CharPanelDriver>,
    cols: usize,
    rows: usize,
    locale: Locale,
    open: bool,
}

impl CharacterDisplay {
    pub fn new(driver: Box<dyn CharPanelDriver>, cols: usize, rows: usize, locale: Locale) -> Self {
        Self {
            driver,
            cols,
            rows,
            locale,
            open: false,
        }
    }

    /// Pad or clip to exactly `cols` characters for a full-row overwrite.
    fn fit_row(&self, text: &str) -> String {
        let mut out: String = text.chars().take(self.cols).collect();
        let used = out.chars().count();
        out.extend(std::iter::repeat(' ').take(self.cols - used));
        out
    }

    fn fps_row(&self, fps: f64) -> String {
        format!("FPS: {fps:.1}")
    }
}

impl DisplayRenderer for CharacterDisplay {
    fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry::Character {
            cols: self.cols,
            rows: self.rows,
        }
    }

    fn open(&mut self) -> Result<(), DisplayError> {
        self.driver.power_on()?;
        self.driver.clear()?;
        self.open = true;
        Ok(())
    }

    fn render(&mut self, lines: &[RankedLine], fps: f64) -> Result<(), DisplayError> {
        let top = lines
            .iter()
            .find(|l| l.slot == 0)
            .map(|l| l.text.as_str())
            .unwrap_or_else(|| labels::idle_text(self.locale));
        let second = lines.iter().find(|l| l.slot == 1);

        let row0 = self.fit_row(top);
        self.driver.write_row(0, &row0)?;

        if self.rows > 1 {
            let row1 = match second {
                Some(line) => self.fit_row(&line.text),
                None => self.fit_row(&self.fps_row(fps)),
            };
            self.driver.write_row(1, &row1)?;
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        self.driver.clear()
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
