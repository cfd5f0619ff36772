// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
use test_log::test;

use anyhow::Result;

use zinnia_common::{
    attributes::{TextAttributes, ZFont, ZStyle},
    chars::{uchs, uchs_to_string, Uch},
    colors::ZColour,
    config::HistoryConfig,
};
use zinnia_history::{
    cursor::{CursorFlags, HistoryCursor, RenderSink, RewindOutcome},
    error::HistoryError,
    history::OutputHistory,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Font(ZFont),
    Style(ZStyle),
    Colour(ZColour, ZColour),
    Text(String),
}

#[derive(Debug, Default)]
struct RecordingSink {
    events: Vec<Event>,
}

impl RenderSink for RecordingSink {
    fn set_font(&mut self, font: ZFont) {
        self.events.push(Event::Font(font));
    }

    fn set_style(&mut self, style: ZStyle) {
        self.events.push(Event::Style(style));
    }

    fn set_colour(&mut self, foreground: ZColour, background: ZColour, _transient: bool) {
        self.events.push(Event::Colour(foreground, background));
    }

    fn emit_text(&mut self, text: &[Uch]) {
        self.events.push(Event::Text(uchs_to_string(text)));
    }
}

fn history_with(text: &str) -> OutputHistory {
    let config = HistoryConfig::new(128, 64, TextAttributes::new(1, 0, 1, 0));
    let mut h = OutputHistory::new(0, &config);
    h.put_text(&uchs(text)).unwrap();
    h
}

#[test]
fn any_write_invalidates_an_open_cursor() {
    let mut h = history_with("Hello\n");

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    h.put_text(&uchs("x")).unwrap();

    assert_eq!(
        cursor.rewind_paragraph(&h),
        Err(HistoryError::CursorInvalidated)
    );
    assert_eq!(
        cursor.replay(&h, 1, true, false),
        Err(HistoryError::CursorInvalidated)
    );
    assert_eq!(cursor.is_at_front(&h), Err(HistoryError::CursorInvalidated));
    assert_eq!(cursor.remember(&h), Err(HistoryError::CursorInvalidated));
}

#[test]
fn metadata_writes_invalidate_too() {
    let mut h = history_with("Hello\n");

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    h.put_style(2).unwrap();

    assert_eq!(
        cursor.rewind_paragraph(&h),
        Err(HistoryError::CursorInvalidated)
    );
}

#[test]
fn skip_validation_is_the_negative_control() {
    let mut h = history_with("Hello\n");

    let mut cursor = HistoryCursor::open(
        &h,
        RecordingSink::default(),
        CursorFlags::SKIP_VALIDATION,
    )
    .unwrap();
    h.put_text(&uchs("x")).unwrap();

    assert!(cursor.rewind_paragraph(&h).is_ok());
}

#[test]
fn remember_and_restore_bracket_a_side_trip() -> Result<()> {
    let mut h = history_with("one\ntwo\nthree\n");

    let mut cursor = HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty())?;
    cursor.rewind_paragraph(&h)?;
    cursor.rewind_paragraph(&h)?;

    // Now at "three". Remember, wander further back, come back.
    cursor.remember(&h)?;
    cursor.rewind_paragraph(&h)?;
    cursor.rewind_paragraph(&h)?;
    cursor.restore()?;

    cursor.replay(&h, 1, false, false)?;

    let sink = cursor.close();
    assert_eq!(sink.events[3..], [Event::Text("three".to_string())]);
    Ok(())
}

#[test]
fn restore_without_remember_is_refused() {
    let h = history_with("Hello\n");

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    assert_eq!(cursor.restore(), Err(HistoryError::NoSavedPosition));
}

#[test]
fn paragraph_attributes_can_be_edited_in_place() {
    let config = HistoryConfig::new(128, 64, TextAttributes::new(1, 0, 1, 0));
    let mut h = OutputHistory::new(0, &config);
    h.put_paragraph_attr(5, 7).unwrap();
    h.put_text(&uchs("Indented\n")).unwrap();

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::FROM_BACK).unwrap();
    cursor.replay(&h, 1, true, true).unwrap();
    cursor.set_last_paragraph_attrs(&mut h, 9, 11).unwrap();
    drop(cursor.close());

    let mut check =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    check.rewind_paragraph(&h).unwrap();
    assert_eq!(
        check.rewind_paragraph(&h).unwrap(),
        RewindOutcome::Paragraph {
            chars: 8,
            attributes: Some((9, 11))
        }
    );
}

#[test]
fn editing_attributes_requires_having_seen_a_record() {
    let mut h = history_with("plain\n");

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    assert_eq!(
        cursor.set_last_paragraph_attrs(&mut h, 1, 2),
        Err(HistoryError::NoParagraphAttributeSeen)
    );
}

#[test]
fn removing_trailing_characters_hides_them_from_replay() {
    let mut h = history_with("look\n> go north");

    h.remove_trailing(10).unwrap();

    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::FROM_BACK).unwrap();
    cursor.replay(&h, 1, false, true).unwrap();

    let sink = cursor.close();
    assert_eq!(sink.events[3..], [Event::Text("look".to_string())]);
}

#[test]
fn removing_more_than_retained_is_refused() {
    let mut h = history_with("ab");

    assert_eq!(h.remove_trailing(5), Err(HistoryError::AtOldest));
    // The refused call must not have moved anything.
    let mut cursor =
        HistoryCursor::open(&h, RecordingSink::default(), CursorFlags::empty()).unwrap();
    assert_eq!(
        cursor.rewind_paragraph(&h).unwrap(),
        RewindOutcome::Paragraph {
            chars: 2,
            attributes: None
        }
    );
}
