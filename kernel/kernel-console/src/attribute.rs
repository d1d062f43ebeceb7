/// The sixteen VGA text-mode palette entries.
///
/// Values match the hardware attribute nibbles; backgrounds above
/// [`Color::LightGray`] blink on real CRT controllers unless the blink
/// bit is repurposed as intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

/// A VGA attribute byte: background in the high nibble, foreground in the low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Attribute(u8);

impl Attribute {
    /// Combine a foreground and background color.
    #[inline]
    #[must_use]
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self((background as u8) << 4 | (foreground as u8))
    }

    /// The raw attribute byte.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Foreground palette index (low nibble).
    #[inline]
    #[must_use]
    pub const fn foreground(self) -> u8 {
        self.0 & 0x0F
    }

    /// Background palette index (high nibble).
    #[inline]
    #[must_use]
    pub const fn background(self) -> u8 {
        self.0 >> 4
    }
}

/// White on black, the boot console scheme.
impl Default for Attribute {
    fn default() -> Self {
        Self::new(Color::White, Color::Black)
    }
}
