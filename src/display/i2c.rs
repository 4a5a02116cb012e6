#![cfg(feature = "hw-i2c")]

//! Linux I2C panel drivers (Raspberry Pi, via rppal).
//!
//! Two driver implementations for the two supported panel classes:
//! - `Hd44780Driver`: character LCD behind a PCF8574 I/O expander backpack
//!   (4-bit mode, EN-strobed nibbles).
//! - `Ssd1306Driver`: 128x64 monochrome OLED, page-addressed framebuffer
//!   transfers.
//!
//! Bus write failures surface as `DisplayError::Transient`; the frame loop
//! owns the retry/skip policy.

use std::thread::sleep;
use std::time::Duration;

use rppal::i2c::I2c;

use crate::display::driver::{CharPanelDriver, PixelPanelDriver};
use crate::display::DisplayError;

fn bus_err(context: &str, err: rppal::i2c::Error) -> DisplayError {
    DisplayError::Transient(format!("{context}: {err}"))
}

fn open_bus(bus: u8, address: u16) -> Result<I2c, DisplayError> {
    let mut i2c = I2c::with_bus(bus).map_err(|e| bus_err("open i2c bus", e))?;
    i2c.set_slave_address(address)
        .map_err(|e| bus_err("set slave address", e))?;
    Ok(i2c)
}

// ----------------------------------------------------------------------------
// HD44780 via PCF8574
// ----------------------------------------------------------------------------

// PCF8574 backpack pin mapping.
const LCD_RS: u8 = 0x01;
const LCD_EN: u8 = 0x04;
const LCD_BACKLIGHT: u8 = 0x08;

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Hd44780Driver {
    bus: u8,
    address: u16,
    i2c: Option<I2c>,
}

impl Hd44780Driver {
    pub fn new(bus: u8, address: u16) -> Self {
        Self {
            bus,
            address,
            i2c: None,
        }
    }

    fn write_nibble(&mut self, nibble: u8, flags: u8) -> Result<(), DisplayError> {
        let i2c = self
            .i2c
            .as_mut()
            .ok_or_else(|| DisplayError::Transient("lcd bus not open".into()))?;
        let byte = (nibble << 4) | flags | LCD_BACKLIGHT;
        for b in [byte | LCD_EN, byte] {
            i2c.write(&[b]).map_err(|e| bus_err("lcd nibble", e))?;
            sleep(Duration::from_micros(50));
        }
        Ok(())
    }

    fn write_byte(&mut self, value: u8, flags: u8) -> Result<(), DisplayError> {
        self.write_nibble(value >> 4, flags)?;
        self.write_nibble(value & 0x0f, flags)
    }

    fn command(&mut self, value: u8) -> Result<(), DisplayError> {
        self.write_byte(value, 0)
    }
}

impl CharPanelDriver for Hd44780Driver {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        self.i2c = Some(open_bus(self.bus, self.address)?);
        // 4-bit re-sync then function set / display on / entry mode.
        sleep(Duration::from_millis(50));
        for nibble in [0x03, 0x03, 0x03, 0x02] {
            self.write_nibble(nibble, 0)?;
            sleep(Duration::from_millis(5));
        }
        for cmd in [0x28, 0x0c, 0x06] {
            self.command(cmd)?;
        }
        self.clear()
    }

    fn write_row(&mut self, row: usize, text: &str) -> Result<(), DisplayError> {
        let offset = ROW_OFFSETS
            .get(row)
            .copied()
            .ok_or_else(|| DisplayError::Transient(format!("row {row} out of range")))?;
        self.command(0x80 | offset)?;
        for c in text.chars() {
            // The HD44780 character ROM is ASCII-adjacent; anything outside
            // the printable ASCII range renders as '?'.
            let byte = if c.is_ascii_graphic() || c == ' ' {
                c as u8
            } else {
                b'?'
            };
            self.write_byte(byte, LCD_RS)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(0x01)?;
        sleep(Duration::from_millis(2));
        Ok(())
    }

    fn power_off(&mut self) {
        // Display off; ignore failures, the handle is going away.
        let _ = self.command(0x08);
        self.i2c = None;
    }
}

// ----------------------------------------------------------------------------
// SSD1306
// ----------------------------------------------------------------------------

const SSD1306_CONTROL_CMD: u8 = 0x00;
const SSD1306_CONTROL_DATA: u8 = 0x40;

pub struct Ssd1306Driver {
    bus: u8,
    address: u16,
    width: u32,
    height: u32,
    i2c: Option<I2c>,
}

impl Ssd1306Driver {
    pub fn new(bus: u8, address: u16, width: u32, height: u32) -> Self {
        Self {
            bus,
            address,
            width,
            height,
            i2c: None,
        }
    }

    fn commands(&mut self, cmds: &[u8]) -> Result<(), DisplayError> {
        let i2c = self
            .i2c
            .as_mut()
            .ok_or_else(|| DisplayError::Transient("oled bus not open".into()))?;
        i2c.block_write(SSD1306_CONTROL_CMD, cmds)
            .map_err(|e| bus_err("oled command", e))
    }
}

impl PixelPanelDriver for Ssd1306Driver {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        self.i2c = Some(open_bus(self.bus, self.address)?);
        let mux = (self.height - 1) as u8;
        self.commands(&[
            0xae, // display off during setup
            0xd5, 0x80, // clock divide
            0xa8, mux, // multiplex ratio
            0xd3, 0x00, // display offset
            0x40, // start line 0
            0x8d, 0x14, // charge pump on
            0x20, 0x00, // horizontal addressing
            0xa1, 0xc8, // segment remap + COM scan direction
            0xda, 0x12, // COM pins
            0xd9, 0xf1, // pre-charge
            0xdb, 0x40, // VCOM detect
            0xa4, 0xa6, // resume from RAM, normal polarity
            0xaf, // display on
        ])
    }

    fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError> {
        self.commands(&[0x81, level])
    }

    fn flush(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        let pages = (self.height.div_ceil(8) - 1) as u8;
        let last_col = (self.width - 1) as u8;
        self.commands(&[0x21, 0x00, last_col, 0x22, 0x00, pages])?;
        let i2c = self
            .i2c
            .as_mut()
            .ok_or_else(|| DisplayError::Transient("oled bus not open".into()))?;
        // The kernel caps a single smbus block transfer; chunk the buffer.
        for chunk in buffer.chunks(32) {
            i2c.block_write(SSD1306_CONTROL_DATA, chunk)
                .map_err(|e| bus_err("oled data", e))?;
        }
        Ok(())
    }

    fn power_off(&mut self) {
        let _ = self.commands(&[0xae]);
        self.i2c = None;
    }
}
