use std::fmt;

use image::Rgb;

/// A pixel packed as 5-6-5: red in bits 15..11, green in 10..5, blue in 4..0.
///
/// Each channel keeps only its top bits; the low bits are truncated, not rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16;
        let g6 = (g >> 2) as u16;
        let b5 = (b >> 3) as u16;
        Rgb565((r5 << 11) | (g6 << 5) | b5)
    }

    /// 5-bit red field.
    pub fn red(self) -> u8 {
        (self.0 >> 11) as u8 & 0x1F
    }

    /// 6-bit green field.
    pub fn green(self) -> u8 {
        (self.0 >> 5) as u8 & 0x3F
    }

    /// 5-bit blue field.
    pub fn blue(self) -> u8 {
        self.0 as u8 & 0x1F
    }
}

impl From<Rgb<u8>> for Rgb565 {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Rgb565::from_rgb(r, g, b)
    }
}

/// Formats as a C hex literal, e.g. `0xF800`.
impl fmt::Display for Rgb565 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
