// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt;

use thiserror::Error;

/// A colour as the interpreter numbers them.
///
/// `-2` marks an undefined colour, `-1` the colour under the cursor, `0`
/// "keep the current colour", `1` the interface default, and `2..=12` the
/// named palette. Values up to [`Z_COLOUR_MAX`] are reserved for interface
/// extensions.
pub type ZColour = i16;

pub const Z_COLOUR_UNDEFINED: ZColour = -2;
pub const Z_COLOUR_UNDER_CURSOR: ZColour = -1;
pub const Z_COLOUR_CURRENT: ZColour = 0;
pub const Z_COLOUR_DEFAULT: ZColour = 1;
pub const Z_COLOUR_BLACK: ZColour = 2;
pub const Z_COLOUR_RED: ZColour = 3;
pub const Z_COLOUR_GREEN: ZColour = 4;
pub const Z_COLOUR_YELLOW: ZColour = 5;
pub const Z_COLOUR_BLUE: ZColour = 6;
pub const Z_COLOUR_MAGENTA: ZColour = 7;
pub const Z_COLOUR_CYAN: ZColour = 8;
pub const Z_COLOUR_WHITE: ZColour = 9;
pub const Z_COLOUR_LIGHT_GREY: ZColour = 10;
pub const Z_COLOUR_MEDIUM_GREY: ZColour = 11;
pub const Z_COLOUR_DARK_GREY: ZColour = 12;

/// Highest value any interface extension may use.
pub const Z_COLOUR_MAX: ZColour = 15;

/// Whether `colour` lies inside the domain the engine accepts.
#[must_use]
pub const fn is_valid_colour(colour: ZColour) -> bool {
    colour >= Z_COLOUR_UNDEFINED && colour <= Z_COLOUR_MAX
}

/// RGB approximation of a colour code, for renderers without a native
/// palette. Unknown and non-displayable codes fall back to the default
/// foreground (light grey on black heritage).
#[must_use]
pub const fn lookup_rgb_by_colour_code(colour: ZColour) -> (u8, u8, u8) {
    match colour {
        Z_COLOUR_BLACK => (0, 0, 0),
        Z_COLOUR_RED => (205, 0, 0),
        Z_COLOUR_GREEN => (0, 205, 0),
        Z_COLOUR_YELLOW => (205, 205, 0),
        Z_COLOUR_BLUE => (0, 0, 205),
        Z_COLOUR_MAGENTA => (205, 0, 205),
        Z_COLOUR_CYAN => (0, 205, 205),
        Z_COLOUR_WHITE => (229, 229, 229),
        Z_COLOUR_LIGHT_GREY => (192, 192, 192),
        Z_COLOUR_MEDIUM_GREY => (136, 136, 136),
        Z_COLOUR_DARK_GREY => (85, 85, 85),
        _ => (192, 192, 192),
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown colour name: {0}")]
pub struct ParseColourError(String);

/// The named palette, for configuration and diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NamedColour {
    Current,
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    LightGrey,
    MediumGrey,
    DarkGrey,
}

impl NamedColour {
    #[must_use]
    pub const fn code(self) -> ZColour {
        match self {
            Self::Current => Z_COLOUR_CURRENT,
            Self::Default => Z_COLOUR_DEFAULT,
            Self::Black => Z_COLOUR_BLACK,
            Self::Red => Z_COLOUR_RED,
            Self::Green => Z_COLOUR_GREEN,
            Self::Yellow => Z_COLOUR_YELLOW,
            Self::Blue => Z_COLOUR_BLUE,
            Self::Magenta => Z_COLOUR_MAGENTA,
            Self::Cyan => Z_COLOUR_CYAN,
            Self::White => Z_COLOUR_WHITE,
            Self::LightGrey => Z_COLOUR_LIGHT_GREY,
            Self::MediumGrey => Z_COLOUR_MEDIUM_GREY,
            Self::DarkGrey => Z_COLOUR_DARK_GREY,
        }
    }

    #[must_use]
    pub const fn from_code(colour: ZColour) -> Option<Self> {
        match colour {
            Z_COLOUR_CURRENT => Some(Self::Current),
            Z_COLOUR_DEFAULT => Some(Self::Default),
            Z_COLOUR_BLACK => Some(Self::Black),
            Z_COLOUR_RED => Some(Self::Red),
            Z_COLOUR_GREEN => Some(Self::Green),
            Z_COLOUR_YELLOW => Some(Self::Yellow),
            Z_COLOUR_BLUE => Some(Self::Blue),
            Z_COLOUR_MAGENTA => Some(Self::Magenta),
            Z_COLOUR_CYAN => Some(Self::Cyan),
            Z_COLOUR_WHITE => Some(Self::White),
            Z_COLOUR_LIGHT_GREY => Some(Self::LightGrey),
            Z_COLOUR_MEDIUM_GREY => Some(Self::MediumGrey),
            Z_COLOUR_DARK_GREY => Some(Self::DarkGrey),
            _ => None,
        }
    }
}

impl fmt::Display for NamedColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Current => "current",
            Self::Default => "default",
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
            Self::LightGrey => "light grey",
            Self::MediumGrey => "medium grey",
            Self::DarkGrey => "dark grey",
        };

        f.write_str(s)
    }
}

impl std::str::FromStr for NamedColour {
    type Err = ParseColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ret = match s {
            "current" => Self::Current,
            "default" => Self::Default,
            "black" => Self::Black,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "white" => Self::White,
            "light grey" => Self::LightGrey,
            "medium grey" => Self::MediumGrey,
            "dark grey" => Self::DarkGrey,
            _ => return Err(ParseColourError(s.to_string())),
        };
        Ok(ret)
    }
}

#[test]
fn colour_domain_bounds() {
    assert!(is_valid_colour(Z_COLOUR_UNDEFINED));
    assert!(is_valid_colour(Z_COLOUR_MAX));
    assert!(!is_valid_colour(-3));
    assert!(!is_valid_colour(16));
}
