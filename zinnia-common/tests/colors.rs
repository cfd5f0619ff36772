// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
use test_log::test;

use zinnia_common::colors::{
    is_valid_colour, lookup_rgb_by_colour_code, NamedColour, Z_COLOUR_BLACK, Z_COLOUR_DARK_GREY,
    Z_COLOUR_DEFAULT, Z_COLOUR_MAX, Z_COLOUR_UNDEFINED, Z_COLOUR_WHITE,
};

#[test]
fn named_colours_round_trip_through_codes() {
    for colour in [
        NamedColour::Current,
        NamedColour::Default,
        NamedColour::Black,
        NamedColour::Red,
        NamedColour::Green,
        NamedColour::Yellow,
        NamedColour::Blue,
        NamedColour::Magenta,
        NamedColour::Cyan,
        NamedColour::White,
        NamedColour::LightGrey,
        NamedColour::MediumGrey,
        NamedColour::DarkGrey,
    ] {
        assert_eq!(NamedColour::from_code(colour.code()), Some(colour));
    }
}

#[test]
fn named_colours_round_trip_through_strings() {
    let colour = "dark grey".parse::<NamedColour>();
    assert_eq!(colour, Ok(NamedColour::DarkGrey));
    assert_eq!(NamedColour::DarkGrey.code(), Z_COLOUR_DARK_GREY);
    assert_eq!(NamedColour::DarkGrey.to_string(), "dark grey");

    assert!("chartreuse".parse::<NamedColour>().is_err());
}

#[test]
fn codes_outside_named_palette_have_no_name() {
    assert_eq!(NamedColour::from_code(Z_COLOUR_UNDEFINED), None);
    assert_eq!(NamedColour::from_code(Z_COLOUR_MAX), None);
}

#[test]
fn rgb_lookup_covers_the_displayable_palette() {
    assert_eq!(lookup_rgb_by_colour_code(Z_COLOUR_BLACK), (0, 0, 0));
    assert_eq!(lookup_rgb_by_colour_code(Z_COLOUR_WHITE), (229, 229, 229));
    // Non-displayable codes fall back to the default foreground.
    assert_eq!(
        lookup_rgb_by_colour_code(Z_COLOUR_DEFAULT),
        lookup_rgb_by_colour_code(Z_COLOUR_UNDEFINED)
    );
}

#[test]
fn colour_domain_matches_the_engine() {
    for colour in -2..=15 {
        assert!(is_valid_colour(colour));
    }
    assert!(!is_valid_colour(-3));
    assert!(!is_valid_colour(16));
}
