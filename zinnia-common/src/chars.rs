// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// A single code unit of interpreter output.
///
/// Wide enough for any displayable character plus the handful of control
/// values the engine reserves. The value `0` never appears as payload text;
/// the history buffer claims it as its in-band escape.
pub type Uch = u32;

/// The sole paragraph terminator in interpreter output.
pub const UCS_NEWLINE: Uch = 0x0a;

/// Converts a `&str` into output code units.
#[must_use]
pub fn uchs(s: &str) -> Vec<Uch> {
    s.chars().map(|c| c as Uch).collect()
}

/// Renders code units back into a `String`, mapping anything that is not a
/// valid scalar value to U+FFFD.
#[must_use]
pub fn uchs_to_string(units: &[Uch]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
