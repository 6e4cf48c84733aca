//! Log-backed stand-in for the 16x2 character LCD.
//!
//! Keeps a frame of the two rows and logs a row whenever text lands on it.
//! Boards without the LCD use this so the clock readout still shows up on
//! the serial console.

use core::convert::Infallible;

use crate::traits::CharacterDisplay;

/// Columns per row.
pub const LCD_COLS: usize = 16;

/// Rows on the display.
pub const LCD_ROWS: usize = 2;

/// Character display that renders to the `log` facade.
///
/// # Example
///
/// ```rust
/// use garage_link::hal::ConsoleDisplay;
/// use garage_link::traits::CharacterDisplay;
///
/// let mut lcd = ConsoleDisplay::new();
/// lcd.write_str("Time:").unwrap();
/// lcd.set_cursor(7, 1).unwrap();
/// lcd.write_str("08:15:00").unwrap();
///
/// assert_eq!(lcd.row(0), "Time:           ");
/// assert_eq!(lcd.row(1), "       08:15:00 ");
/// ```
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    frame: [[u8; LCD_COLS]; LCD_ROWS],
    col: usize,
    row: usize,
    backlight: (u8, u8, u8),
}

impl ConsoleDisplay {
    /// Creates a blank display with the cursor at home.
    pub const fn new() -> Self {
        Self {
            frame: [[b' '; LCD_COLS]; LCD_ROWS],
            col: 0,
            row: 0,
            backlight: (0, 0, 0),
        }
    }

    /// Text of `row`, padded to the full width.
    pub fn row(&self, row: usize) -> &str {
        // Frame only ever holds ASCII.
        core::str::from_utf8(&self.frame[row.min(LCD_ROWS - 1)]).unwrap_or("")
    }

    /// Current cursor as (col, row).
    pub fn cursor(&self) -> (usize, usize) {
        (self.col, self.row)
    }

    /// Last backlight color set.
    pub fn backlight(&self) -> (u8, u8, u8) {
        self.backlight
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterDisplay for ConsoleDisplay {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Infallible> {
        self.frame = [[b' '; LCD_COLS]; LCD_ROWS];
        self.col = 0;
        self.row = 0;
        Ok(())
    }

    fn set_backlight_rgb(&mut self, r: u8, g: u8, b: u8) -> Result<(), Infallible> {
        self.backlight = (r, g, b);
        log::debug!("LCD backlight {},{},{}", r, g, b);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Infallible> {
        self.col = usize::from(col).min(LCD_COLS);
        self.row = usize::from(row).min(LCD_ROWS - 1);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Infallible> {
        for c in text.chars() {
            if self.col >= LCD_COLS {
                break;
            }
            self.frame[self.row][self.col] = if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            };
            self.col += 1;
        }
        log::info!("LCD {}: {}", self.row, self.row(self.row));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_clips_at_row_end() {
        let mut lcd = ConsoleDisplay::new();
        lcd.set_cursor(12, 0).unwrap();
        lcd.write_str("123456").unwrap();
        assert_eq!(lcd.row(0), "            1234");
        assert_eq!(lcd.cursor(), (16, 0));
    }

    #[test]
    fn clear_blanks_and_homes() {
        let mut lcd = ConsoleDisplay::new();
        lcd.set_cursor(3, 1).unwrap();
        lcd.write_str("abc").unwrap();
        lcd.clear().unwrap();
        assert_eq!(lcd.row(1), " ".repeat(LCD_COLS));
        assert_eq!(lcd.cursor(), (0, 0));
    }

    #[test]
    fn non_ascii_is_replaced() {
        let mut lcd = ConsoleDisplay::new();
        lcd.write_str("é!").unwrap();
        assert!(lcd.row(0).starts_with("?!"));
    }

    #[test]
    fn rows_beyond_display_clamp() {
        let mut lcd = ConsoleDisplay::new();
        lcd.set_cursor(0, 9).unwrap();
        lcd.write_str("x").unwrap();
        assert!(lcd.row(1).starts_with('x'));
    }
}
