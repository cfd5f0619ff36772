// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use zinnia_common::{
    attributes::{ZFont, ZStyle},
    chars::Uch,
    colors::{is_valid_colour, ZColour},
};

use crate::error::HistoryError;

/// First code unit of every in-band metadata record. Payload text never
/// contains this value, so no escaping of regular output is needed.
pub const METADATA_ESCAPE: Uch = 0;

pub(crate) const METADATA_TYPE_FONT: Uch = 1;
pub(crate) const METADATA_TYPE_STYLE: Uch = 2;
pub(crate) const METADATA_TYPE_COLOUR: Uch = 3;
pub(crate) const METADATA_TYPE_PARAGRAPH_ATTRIBUTE: Uch = 4;

/// Bias added to every encoded parameter. Keeps parameter cells clear of
/// both the escape (0) and the newline (10), so paragraph scans stay a
/// plain byte comparison.
pub(crate) const METADATA_DATA_OFFSET: i32 = 13;

/// Longest encoded record, in code units. The ring must always be at least
/// this large.
pub const MAX_RECORD_LEN: usize = 4;

/// Interval, in ring offsets of the write position, at which the writer
/// drops a synthetic font/style/colour triple so a cursor landing anywhere
/// can rebuild its attribute state within a bounded backward scan.
pub const STATE_BLOCK_SIZE: usize = 256;

/// Smallest parameter value any record kind accepts; below this the bias
/// could collide with the escape or the newline.
pub(crate) const MIN_PARAMETER: i16 = -2;

/// An attribute change as it travels through the history, in-band.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetadataRecord {
    Font(ZFont),
    Style(ZStyle),
    Colour(ZColour, ZColour),
    ParagraphAttribute(i16, i16),
}

impl MetadataRecord {
    /// Encoded length of a record, given its type cell. `None` for
    /// anything that is not a known type code.
    #[must_use]
    pub(crate) const fn len_for_type(type_cell: Uch) -> Option<usize> {
        match type_cell {
            METADATA_TYPE_FONT | METADATA_TYPE_STYLE => Some(3),
            METADATA_TYPE_COLOUR | METADATA_TYPE_PARAGRAPH_ATTRIBUTE => Some(4),
            _ => None,
        }
    }

    pub(crate) fn validate(self) -> Result<(), HistoryError> {
        match self {
            Self::Font(font) => {
                if font < MIN_PARAMETER {
                    return Err(HistoryError::InvalidParameter("font"));
                }
            }
            Self::Style(style) => {
                if style < MIN_PARAMETER {
                    return Err(HistoryError::InvalidParameter("style"));
                }
            }
            Self::Colour(foreground, background) => {
                if !is_valid_colour(foreground) || !is_valid_colour(background) {
                    return Err(HistoryError::InvalidParameter("colour"));
                }
            }
            Self::ParagraphAttribute(attr1, attr2) => {
                if attr1 < MIN_PARAMETER || attr2 < MIN_PARAMETER {
                    return Err(HistoryError::InvalidParameter("paragraph attribute"));
                }
            }
        }

        Ok(())
    }

    /// Writes the record into `out` and returns the encoded length.
    pub(crate) fn encode(self, out: &mut [Uch; MAX_RECORD_LEN]) -> usize {
        out[0] = METADATA_ESCAPE;
        match self {
            Self::Font(font) => {
                out[1] = METADATA_TYPE_FONT;
                out[2] = bias(font);
                3
            }
            Self::Style(style) => {
                out[1] = METADATA_TYPE_STYLE;
                out[2] = bias(style);
                3
            }
            Self::Colour(foreground, background) => {
                out[1] = METADATA_TYPE_COLOUR;
                out[2] = bias(foreground);
                out[3] = bias(background);
                4
            }
            Self::ParagraphAttribute(attr1, attr2) => {
                out[1] = METADATA_TYPE_PARAGRAPH_ATTRIBUTE;
                out[2] = bias(attr1);
                out[3] = bias(attr2);
                4
            }
        }
    }
}

#[allow(clippy::cast_sign_loss)]
pub(crate) const fn bias(parameter: i16) -> Uch {
    (parameter as i32 + METADATA_DATA_OFFSET) as Uch
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) const fn unbias(cell: Uch) -> i16 {
    (cell as i32 - METADATA_DATA_OFFSET) as i16
}
