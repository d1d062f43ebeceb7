use core::fmt;

use kernel_info::vga::{VGA_COLUMNS, VGA_ROWS, VGA_TEXT_BASE};

use crate::attribute::{Attribute, Color};

/// A writer over an 80x25 VGA text-mode cell buffer.
///
/// Each cell is one `u16`: the glyph byte in the low half and the
/// [`Attribute`] byte in the high half. All stores go through
/// [`write_volatile`](core::ptr::write_volatile) so the compiler never
/// elides or reorders them behind the device's back.
///
/// Output advances a cursor left to right, top to bottom. `\n` starts a
/// new line, `\r` returns to the start of the current one, and writing
/// past the last row scrolls the screen up by one line.
pub struct TextBuffer {
    cells: *mut u16,
    row: usize,
    column: usize,
    attribute: Attribute,
}

/// Cells in one screen of text.
pub const CELL_COUNT: usize = VGA_ROWS * VGA_COLUMNS;

// Safety: The buffer is always used under TicketLock; the cell pointer is
// only dereferenced while locked.
unsafe impl Send for TextBuffer {}

impl TextBuffer {
    /// Wraps a raw cell buffer.
    ///
    /// # Safety
    ///
    /// `cells` must be valid for volatile reads and writes of
    /// `VGA_ROWS * VGA_COLUMNS` consecutive `u16` values for the lifetime
    /// of the returned buffer, and no other code may access those cells
    /// while it is alive.
    #[must_use]
    pub const unsafe fn from_raw(cells: *mut u16) -> Self {
        Self {
            cells,
            row: 0,
            column: 0,
            attribute: Attribute::new(Color::White, Color::Black),
        }
    }

    /// Wraps the standard VGA text buffer at physical `0xB8000`.
    ///
    /// # Safety
    ///
    /// The VGA text buffer must be identity-mapped and writable, and
    /// nothing else may write to it while the returned buffer is in use.
    #[must_use]
    pub unsafe fn vga_text_mode() -> Self {
        // SAFETY: The caller guarantees the 0xB8000 window is mapped and
        // exclusively ours; the hardware buffer is 80 * 25 cells.
        unsafe { Self::from_raw(VGA_TEXT_BASE.as_u64() as usize as *mut u16) }
    }

    /// Wraps a borrowed cell array, e.g. for host-side rendering tests.
    #[must_use]
    pub fn from_cells(cells: &'static mut [u16; CELL_COUNT]) -> Self {
        // SAFETY: An exclusive 'static borrow covers exactly CELL_COUNT
        // cells for as long as the buffer can live.
        unsafe { Self::from_raw(cells.as_mut_ptr()) }
    }

    /// The attribute applied to subsequently written glyphs.
    #[inline]
    #[must_use]
    pub const fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Changes the attribute for subsequently written glyphs.
    #[inline]
    pub const fn set_attribute(&mut self, attribute: Attribute) {
        self.attribute = attribute;
    }

    /// Current cursor position as `(row, column)`.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    /// Blanks the screen with the current attribute and homes the cursor.
    pub fn clear(&mut self) {
        let blank = self.blank_cell();
        for index in 0..VGA_ROWS * VGA_COLUMNS {
            // SAFETY: `index` stays below the cell count guaranteed at
            // construction.
            unsafe { self.cells.add(index).write_volatile(blank) };
        }
        self.row = 0;
        self.column = 0;
    }

    /// Writes one byte, interpreting `\n` and `\r`.
    pub fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.newline(),
            b'\r' => self.column = 0,
            byte => {
                if self.column >= VGA_COLUMNS {
                    self.newline();
                }
                self.put_cell(self.row, self.column, byte);
                self.column += 1;
            }
        }
    }

    fn newline(&mut self) {
        self.column = 0;
        if self.row + 1 == VGA_ROWS {
            self.scroll_up();
        } else {
            self.row += 1;
        }
    }

    /// Moves rows 1..25 up by one and blanks the last row.
    fn scroll_up(&mut self) {
        for index in VGA_COLUMNS..VGA_ROWS * VGA_COLUMNS {
            // SAFETY: Both `index` and `index - VGA_COLUMNS` stay below the
            // cell count guaranteed at construction.
            unsafe {
                let cell = self.cells.add(index).read_volatile();
                self.cells.add(index - VGA_COLUMNS).write_volatile(cell);
            }
        }

        let blank = self.blank_cell();
        for column in 0..VGA_COLUMNS {
            // SAFETY: The last row lies within the cell count guaranteed at
            // construction.
            unsafe {
                self.cells
                    .add((VGA_ROWS - 1) * VGA_COLUMNS + column)
                    .write_volatile(blank);
            }
        }
    }

    fn put_cell(&mut self, row: usize, column: usize, byte: u8) {
        debug_assert!(row < VGA_ROWS && column < VGA_COLUMNS);
        let cell = (u16::from(self.attribute.as_u8()) << 8) | u16::from(byte);
        // SAFETY: `row` and `column` are in range, so the offset stays below
        // the cell count guaranteed at construction.
        unsafe { self.cells.add(row * VGA_COLUMNS + column).write_volatile(cell) };
    }

    const fn blank_cell(&self) -> u16 {
        (self.attribute.as_u8() as u16) << 8 | b' ' as u16
    }
}

impl fmt::Write for TextBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
