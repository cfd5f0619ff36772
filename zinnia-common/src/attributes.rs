// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::colors::{ZColour, Z_COLOUR_BLACK, Z_COLOUR_WHITE};

/// A font as the interpreter numbers them.
pub type ZFont = i16;

pub const Z_FONT_PREVIOUS: ZFont = 0;
pub const Z_FONT_NORMAL: ZFont = 1;
pub const Z_FONT_PICTURE: ZFont = 2;
pub const Z_FONT_CHARACTER_GRAPHICS: ZFont = 3;
pub const Z_FONT_COURIER_FIXED_PITCH: ZFont = 4;

/// A text style bitmask.
pub type ZStyle = i16;

pub const Z_STYLE_ROMAN: ZStyle = 0;
pub const Z_STYLE_REVERSE_VIDEO: ZStyle = 1;
pub const Z_STYLE_BOLD: ZStyle = 2;
pub const Z_STYLE_ITALIC: ZStyle = 4;
pub const Z_STYLE_FIXED_PITCH: ZStyle = 8;

/// The full set of display attributes a run of output carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextAttributes {
    pub font: ZFont,
    pub style: ZStyle,
    pub foreground: ZColour,
    pub background: ZColour,
}

impl TextAttributes {
    #[must_use]
    pub const fn new(
        font: ZFont,
        style: ZStyle,
        foreground: ZColour,
        background: ZColour,
    ) -> Self {
        Self {
            font,
            style,
            foreground,
            background,
        }
    }
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self {
            font: Z_FONT_NORMAL,
            style: Z_STYLE_ROMAN,
            foreground: Z_COLOUR_WHITE,
            background: Z_COLOUR_BLACK,
        }
    }
}
