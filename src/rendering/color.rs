//! Display colors for cells.
//!
//! A cell's color byte maps straight to a hue; no palette table is needed
//! to paint, so cells placed with any value render consistently.

use serde::{Deserialize, Serialize};

/// Hue step per color unit, in degrees.
const HUE_PER_UNIT: f64 = 1.4;
const CELL_SATURATION: f64 = 80.0;
const CELL_LIGHTNESS: f64 = 55.0;

/// Hue/saturation/lightness with `h` in degrees and `s`/`l` in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    /// Deterministic display color of a cell color value
    pub fn for_cell(color: u8) -> Self {
        Self {
            h: (f64::from(color) * HUE_PER_UNIT) % 360.0,
            s: CELL_SATURATION,
            l: CELL_LIGHTNESS,
        }
    }

    pub fn to_css(&self) -> String {
        format!("hsl({} {}% {}%)", self.h, self.s, self.l)
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb` or `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut it = digits.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => None,
        }
    }
}

impl From<Hsl> for Rgba {
    fn from(hsl: Hsl) -> Self {
        let s = (hsl.s / 100.0).clamp(0.0, 1.0);
        let l = (hsl.l / 100.0).clamp(0.0, 1.0);
        let h = hsl.h.rem_euclid(360.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = h / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

        Rgba::rgb(to_byte(r), to_byte(g), to_byte(b))
    }
}

/// Fill color of a cell
pub fn cell_fill(color: u8) -> Rgba {
    Hsl::for_cell(color).into()
}
