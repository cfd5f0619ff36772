// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.
use test_log::test;

use std::cell::RefCell;
use std::rc::Rc;

use zinnia_common::{attributes::TextAttributes, chars::uchs, config::HistoryConfig};
use zinnia_history::history::OutputHistory;

fn tiny_history() -> OutputHistory {
    let config = HistoryConfig::new(16, 16, TextAttributes::new(1, 0, 1, 0));
    OutputHistory::new(0, &config)
}

fn record_removals(h: &mut OutputHistory) -> Rc<RefCell<Vec<(i16, i16)>>> {
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    h.set_paragraph_removal_callback(move |attr1, attr2| sink.borrow_mut().push((attr1, attr2)));
    removed
}

#[test]
fn evicting_an_attributed_paragraph_fires_the_callback_once() {
    let mut h = tiny_history();
    let removed = record_removals(&mut h);

    h.put_paragraph_attr(5, 7).unwrap();
    h.put_text(&uchs("P1\n")).unwrap();
    assert!(removed.borrow().is_empty());

    // Fill the remaining 9 cells, then push the old paragraph out.
    h.put_text(&uchs("abcdefghi")).unwrap();
    assert!(removed.borrow().is_empty());

    h.put_text(&uchs("jklm")).unwrap();
    h.put_text(&uchs("nopq")).unwrap();
    h.put_text(&uchs("rstu")).unwrap();

    assert_eq!(*removed.borrow(), vec![(5, 7)]);
}

#[test]
fn every_attributed_paragraph_is_reported_exactly_once() {
    let config = HistoryConfig::new(32, 32, TextAttributes::new(1, 0, 1, 0));
    let mut h = OutputHistory::new(0, &config);
    let removed = record_removals(&mut h);

    for attr in 1..=4 {
        h.put_paragraph_attr(attr, attr * 10).unwrap();
        h.put_text(&uchs("some paragraph\n")).unwrap();
    }

    // Everything with an attribute has been overwritten at least once by
    // now; each pair must have been reported exactly once.
    let mut reported = removed.borrow().clone();
    reported.sort_unstable();
    reported.dedup();
    assert_eq!(removed.borrow().len(), reported.len());

    for pair in reported {
        assert!(pair.0 >= 1 && pair.0 <= 4);
        assert_eq!(pair.1, pair.0 * 10);
    }
}

#[test]
fn eviction_without_a_callback_still_proceeds() {
    let mut h = tiny_history();

    h.put_paragraph_attr(5, 7).unwrap();
    h.put_text(&uchs("P1\n")).unwrap();
    for _ in 0..8 {
        h.put_text(&uchs("filler\n")).unwrap();
    }

    assert_eq!(h.allocated_size(), 16);
}

#[test]
fn whole_buffer_overwrite_reports_evicted_attributes() {
    let mut h = tiny_history();
    let removed = record_removals(&mut h);

    h.put_paragraph_attr(3, 4).unwrap();
    h.put_text(&uchs("short\n")).unwrap();

    // A write at least as large as the whole buffer retires everything.
    h.put_text(&uchs("0123456789abcdef")).unwrap();

    assert_eq!(*removed.borrow(), vec![(3, 4)]);
}
