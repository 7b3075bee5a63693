//! # Color
//! The clock's fixed color table and the rainbow color wheel used by the visual alarm.

use serde::{Deserialize, Serialize};
use smart_leds::RGB8;

/// Named entries of the clock color table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ColorId {
    /// #FF0000
    Red = 0,
    /// #FF8F00
    #[default]
    Orange,
    /// #FFF800
    Yellow,
    /// #B5DF00
    Lime,
    /// #00FF00
    Green,
    /// #00FF98
    Turquoise,
    /// #00FFFF
    Cyan,
    /// #00B0E0
    Cobalt,
    /// #0000FF
    Blue,
    /// #B700FF
    Violet,
    /// #FF00FF
    Magenta,
    /// #DF007F
    Pink,
    /// #FFFFFF
    White,
}

/// RGB values of the color table, indexed by [`ColorId`]
const COLOR_TABLE: [RGB8; 13] = [
    RGB8::new(0xFF, 0x00, 0x00),
    RGB8::new(0xFF, 0x8F, 0x00),
    RGB8::new(0xFF, 0xF8, 0x00),
    RGB8::new(0xB5, 0xDF, 0x00),
    RGB8::new(0x00, 0xFF, 0x00),
    RGB8::new(0x00, 0xFF, 0x98),
    RGB8::new(0x00, 0xFF, 0xFF),
    RGB8::new(0x00, 0xB0, 0xE0),
    RGB8::new(0x00, 0x00, 0xFF),
    RGB8::new(0xB7, 0x00, 0xFF),
    RGB8::new(0xFF, 0x00, 0xFF),
    RGB8::new(0xDF, 0x00, 0x7F),
    RGB8::new(0xFF, 0xFF, 0xFF),
];

impl ColorId {
    /// Number of entries in the color table
    pub const COUNT: u8 = 13;

    /// Look up a table entry by index; out-of-range indices yield `None`
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => Self::Red,
            1 => Self::Orange,
            2 => Self::Yellow,
            3 => Self::Lime,
            4 => Self::Green,
            5 => Self::Turquoise,
            6 => Self::Cyan,
            7 => Self::Cobalt,
            8 => Self::Blue,
            9 => Self::Violet,
            10 => Self::Magenta,
            11 => Self::Pink,
            12 => Self::White,
            _ => return None,
        })
    }

    /// Table index of this color
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// RGB value of this color
    #[must_use]
    pub const fn rgb(self) -> RGB8 {
        COLOR_TABLE[self as usize]
    }
}

/// Input a value 0 to 255 to get a color value.
/// The colours are a transition g - r - b - back to g.
#[must_use]
pub const fn rainbow(value: u8) -> RGB8 {
    if value < 85 {
        return RGB8::new(value * 3, 255 - value * 3, 0);
    }
    if value < 170 {
        let v = value - 85;
        return RGB8::new(255 - v * 3, 0, v * 3);
    }
    let v = value - 170;
    RGB8::new(0, v * 3, 255 - v * 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rainbow_segments_meet_at_primaries() {
        assert_eq!(rainbow(0), RGB8::new(0, 255, 0));
        assert_eq!(rainbow(85), RGB8::new(255, 0, 0));
        assert_eq!(rainbow(170), RGB8::new(0, 0, 255));
        assert_eq!(rainbow(255), RGB8::new(0, 255, 0));
    }

    #[test]
    fn table_lookup() {
        assert_eq!(ColorId::from_index(12), Some(ColorId::White));
        assert_eq!(ColorId::from_index(13), None);
        assert_eq!(ColorId::Red.rgb(), RGB8::new(255, 0, 0));
        assert_eq!(ColorId::Pink.index(), 11);
    }
}
