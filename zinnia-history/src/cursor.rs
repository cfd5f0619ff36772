// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use bitflags::bitflags;
use zinnia_common::{
    attributes::{TextAttributes, ZFont, ZStyle},
    chars::{Uch, UCS_NEWLINE},
    colors::ZColour,
};

use crate::{
    error::HistoryError,
    history::OutputHistory,
    metadata::{
        bias, unbias, MetadataRecord, METADATA_ESCAPE, METADATA_TYPE_COLOUR, METADATA_TYPE_FONT,
        METADATA_TYPE_PARAGRAPH_ATTRIBUTE, METADATA_TYPE_STYLE,
    },
    ring::Ring,
};

/// Output scratch used while replaying; flushed to the sink whenever it
/// fills, a record is crossed, or a paragraph ends.
const REPLAY_BUF_SIZE: usize = 1280;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CursorFlags: u8 {
        /// Start at the oldest retained character instead of the front.
        const FROM_BACK = 0b0000_0001;
        /// Skip the epoch check on every operation. The caller asserts it
        /// will not write to the history while the cursor is open.
        const SKIP_VALIDATION = 0b0000_0010;
    }
}

/// Receives replayed output. Implemented by renderers.
pub trait RenderSink {
    fn set_font(&mut self, font: ZFont);
    fn set_style(&mut self, style: ZStyle);
    /// `transient` is true when the change merely replays historical state
    /// rather than a live interpreter request.
    fn set_colour(&mut self, foreground: ZColour, background: ZColour, transient: bool);
    fn emit_text(&mut self, text: &[Uch]);
}

/// Result of rewinding the cursor by one paragraph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RewindOutcome {
    /// The cursor now sits on the first character of the previous
    /// paragraph. `chars` is its logical length (metadata records count
    /// zero); `attributes` carries the paragraph-attribute pair if the
    /// paragraph has one.
    Paragraph {
        chars: usize,
        attributes: Option<(i16, i16)>,
    },
    /// Nothing older is retained.
    AtEnd,
}

/// The complete walk state, detachable so positions can be remembered and
/// restored wholesale.
#[derive(Clone, Copy, Debug)]
struct CursorState {
    position: usize,
    /// Start-boundary crossings remaining between `position` and the
    /// ring's back.
    wraps: u32,
    attrs: TextAttributes,
    metadata_evaluated: bool,
    found_end_of_buffer: bool,
    first_iteration_done: bool,
    dont_skip_newline: bool,
    newline_terminated: bool,
    last_paragraph_attribute_index: Option<usize>,
    /// Attribute state reconstructed for a state block, keyed by block
    /// offset, so blocks already consulted are not re-scanned.
    cached_block: Option<(usize, TextAttributes)>,
    /// Set when the cursor was opened at the back of a completely full
    /// ring: it is positionally equal to the front but one lap behind it.
    lap_behind_front: bool,
}

/// A read-mostly walker over one window's history.
///
/// The cursor holds no reference to the history; each operation takes it
/// as an argument and first checks that the `(wraps, front)` epoch captured
/// at open time still holds. Any write moves the epoch, so any write
/// invalidates every open cursor.
pub struct HistoryCursor<S> {
    sink: S,
    snapshot_wraps: u32,
    snapshot_front: usize,
    validation_disabled: bool,
    state: CursorState,
    saved: Option<CursorState>,
}

impl<S: RenderSink> HistoryCursor<S> {
    /// Opens a cursor over `history`.
    ///
    /// Without `FROM_BACK` the cursor starts on the last character written;
    /// with it, on the oldest retained one.
    ///
    /// # Errors
    /// `Empty` if the history holds no characters.
    pub fn open(
        history: &OutputHistory,
        sink: S,
        flags: CursorFlags,
    ) -> Result<Self, HistoryError> {
        let ring = history.ring();

        if ring.is_empty() {
            return Err(HistoryError::Empty);
        }

        let state = if flags.contains(CursorFlags::FROM_BACK) {
            trace!("opening history cursor at buffer back");
            CursorState {
                position: ring.back,
                wraps: 0,
                // The back-side state is maintained by eviction and is
                // exact here; there is nothing older to scan.
                attrs: history.back_attrs(),
                metadata_evaluated: true,
                found_end_of_buffer: true,
                first_iteration_done: true,
                dont_skip_newline: false,
                newline_terminated: false,
                last_paragraph_attribute_index: None,
                cached_block: None,
                lap_behind_front: ring.wraps > 0 && ring.front == ring.back,
            }
        } else {
            trace!("opening history cursor at buffer front");
            let Some((position, wraps)) = ring.front_walk_start() else {
                return Err(HistoryError::Empty);
            };
            CursorState {
                position,
                wraps,
                attrs: history.front_attrs(),
                metadata_evaluated: false,
                found_end_of_buffer: false,
                first_iteration_done: false,
                dont_skip_newline: false,
                newline_terminated: false,
                last_paragraph_attribute_index: None,
                cached_block: None,
                lap_behind_front: false,
            }
        };

        Ok(Self {
            sink,
            snapshot_wraps: ring.wraps,
            snapshot_front: ring.front,
            validation_disabled: flags.contains(CursorFlags::SKIP_VALIDATION),
            state,
            saved: None,
        })
    }

    /// Hands the sink back when the cursor is done.
    pub fn close(self) -> S {
        self.sink
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Whether the paragraph most recently rewound over was closed by a
    /// newline. Only the unterminated trailing paragraph is not.
    #[must_use]
    pub const fn rewound_paragraph_was_newline_terminated(&self) -> bool {
        self.state.newline_terminated
    }

    /// # Errors
    /// `CursorInvalidated` if the history was written to since `open`.
    pub fn is_at_front(&self, history: &OutputHistory) -> Result<bool, HistoryError> {
        self.check(history)?;

        Ok(self.state.position == history.ring().front && !self.state.lap_behind_front)
    }

    /// Moves the cursor back over one paragraph, leaving it on the
    /// paragraph's first character.
    ///
    /// The very first call on a cursor opened at the front deals with the
    /// trailing paragraph: if the last output character is a newline the
    /// call reports an empty paragraph and notes that the next rewind must
    /// not skip another newline. The walk that runs out of buffer delivers
    /// the partial oldest paragraph once; after that, `AtEnd`.
    ///
    /// # Errors
    /// `CursorInvalidated`, `AtOldest`, or `InconsistentMetadata`.
    #[allow(clippy::too_many_lines)]
    pub fn rewind_paragraph(
        &mut self,
        history: &OutputHistory,
    ) -> Result<RewindOutcome, HistoryError> {
        self.check(history)?;

        let ring = history.ring();
        if ring.capacity() == 0 {
            return Err(HistoryError::Empty);
        }

        trace!(
            "rewinding history output by one paragraph from offset {}",
            self.state.position
        );

        if self.state.found_end_of_buffer {
            return Ok(RewindOutcome::AtEnd);
        }

        let mut idx = self.state.position;
        let mut wraps = self.state.wraps;

        if self.state.first_iteration_done {
            // Between calls the cursor rests on a paragraph's first
            // character; everything before the trailing paragraph is
            // newline-terminated by construction.
            self.state.newline_terminated = true;

            if self.state.dont_skip_newline {
                self.state.dont_skip_newline = false;
            } else {
                idx = ring
                    .step_backward(idx, &mut wraps)
                    .ok_or(HistoryError::AtOldest)?;
            }

            if ring.cells[idx] != UCS_NEWLINE {
                error!("rewind expected a paragraph-closing newline");
                return Err(HistoryError::InconsistentMetadata);
            }

            let newline_idx = idx;
            let newline_wraps = wraps;

            match ring.step_backward(idx, &mut wraps) {
                None => {
                    // The newline we just skipped is the oldest cell; the
                    // paragraph before it is gone.
                    self.state.found_end_of_buffer = true;
                    self.state.position = newline_idx;
                    self.state.wraps = newline_wraps;
                    return Ok(RewindOutcome::Paragraph {
                        chars: 0,
                        attributes: None,
                    });
                }
                Some(prev) if ring.cells[prev] == UCS_NEWLINE => {
                    // Empty paragraph; rest on its newline.
                    self.state.position = newline_idx;
                    self.state.wraps = newline_wraps;
                    return Ok(RewindOutcome::Paragraph {
                        chars: 0,
                        attributes: None,
                    });
                }
                Some(prev) => idx = prev,
            }
        } else {
            self.state.first_iteration_done = true;

            if ring.cells[idx] == UCS_NEWLINE {
                // The trailing paragraph is empty; report it without
                // moving so the next call knows it is already on the
                // newline.
                self.state.dont_skip_newline = true;
                self.state.metadata_evaluated = false;
                self.state.newline_terminated = true;
                return Ok(RewindOutcome::Paragraph {
                    chars: 0,
                    attributes: None,
                });
            }

            self.state.dont_skip_newline = false;
            self.state.newline_terminated = false;
        }

        // idx sits on the last character of the paragraph to rewind over.
        // Walk to its first character, counting logical length and picking
        // up a paragraph-attribute pair if one is crossed. The previous
        // three positions are kept so a record can be decoded the moment
        // its escape cell is reached.
        let mut chars: i64 = 0;
        let mut attributes: Option<(i16, i16)> = None;
        let mut last: Option<(usize, u32)> = None;
        let mut last2: Option<usize> = None;
        let mut last3: Option<usize> = None;

        loop {
            last3 = last2;
            last2 = last.map(|(pos, _)| pos);
            last = Some((idx, wraps));

            let Some(next) = ring.step_backward(idx, &mut wraps) else {
                // Ran out of buffer mid-paragraph: deliver the partial
                // oldest paragraph, then never again.
                self.state.found_end_of_buffer = true;
                let Some((pos, pos_wraps)) = last else {
                    return Err(HistoryError::InconsistentMetadata);
                };
                self.state.position = pos;
                self.state.wraps = pos_wraps;
                self.state.metadata_evaluated = false;
                self.evaluate_metadata(history)?;
                chars += 1;
                return Ok(RewindOutcome::Paragraph {
                    chars: clamp_chars(chars),
                    attributes,
                });
            };
            idx = next;
            chars += 1;

            if ring.cells[idx] == METADATA_ESCAPE {
                let Some((type_idx, _)) = last else {
                    return Err(HistoryError::InconsistentMetadata);
                };
                let record_type = ring.cells[type_idx];

                if record_type == METADATA_TYPE_COLOUR {
                    chars -= 4;
                } else if record_type == METADATA_TYPE_PARAGRAPH_ATTRIBUTE {
                    let (Some(first_idx), Some(second_idx)) = (last2, last3) else {
                        return Err(HistoryError::InconsistentMetadata);
                    };
                    attributes = Some((unbias(ring.cells[first_idx]), unbias(ring.cells[second_idx])));
                    chars -= 4;
                } else {
                    chars -= 3;
                }
            }

            if ring.cells[idx] == UCS_NEWLINE {
                break;
            }
        }

        let Some((pos, pos_wraps)) = last else {
            return Err(HistoryError::InconsistentMetadata);
        };
        self.state.position = pos;
        self.state.wraps = pos_wraps;
        self.state.metadata_evaluated = false;
        self.evaluate_metadata(history)?;

        Ok(RewindOutcome::Paragraph {
            chars: clamp_chars(chars),
            attributes,
        })
    }

    /// Replays up to `n` paragraphs forward into the sink, starting with
    /// the attribute state active at the cursor.
    ///
    /// Metadata records always update the cursor's tracked state; they are
    /// forwarded to the sink only when `include_metadata` is set.
    /// Paragraph-attribute records are never forwarded, but the position
    /// of the most recent one is kept for [`Self::set_last_paragraph_attrs`].
    /// A replayed paragraph is never followed by its newline.
    ///
    /// Returns how many of the `n` paragraphs were *not* delivered; `-1`
    /// when the cursor was already at the front. With `advance` the cursor
    /// moves past the replayed text, otherwise it stays put.
    ///
    /// # Errors
    /// `CursorInvalidated` or `InconsistentMetadata`.
    #[allow(clippy::too_many_lines)]
    pub fn replay(
        &mut self,
        history: &OutputHistory,
        n: i32,
        include_metadata: bool,
        advance: bool,
    ) -> Result<i32, HistoryError> {
        self.check(history)?;

        let ring = history.ring();

        if include_metadata {
            self.evaluate_metadata(history)?;
        }

        trace!(
            "replaying {n} paragraph(s) from offset {}",
            self.state.position
        );

        self.sink.set_font(self.state.attrs.font);
        self.sink.set_style(self.state.attrs.style);
        self.sink.set_colour(
            self.state.attrs.foreground,
            self.state.attrs.background,
            true,
        );

        if advance {
            self.state.found_end_of_buffer = false;
        }

        let mut n = n;
        let mut pos = self.state.position;
        let mut crossings: u32 = 0;
        let mut moved = false;
        let mut buf: Vec<Uch> = Vec::with_capacity(REPLAY_BUF_SIZE);

        fn advance_pos(ring: &Ring, pos: usize, crossings: &mut u32) -> usize {
            let next = ring.step_forward(pos);
            if next == 0 {
                *crossings += 1;
            }
            next
        }

        if pos == ring.front && !self.state.lap_behind_front {
            trace!("cursor already at buffer front");
            n = -1;
        } else {
            while n > 0 {
                if pos == ring.front && moved {
                    if !buf.is_empty() {
                        self.sink.emit_text(&buf);
                        buf.clear();
                    }
                    break;
                }

                let cell = ring.cells[pos];

                if cell == METADATA_ESCAPE {
                    if !buf.is_empty() {
                        self.sink.emit_text(&buf);
                        buf.clear();
                    }

                    let type_idx = advance_pos(ring, pos, &mut crossings);
                    let record_type = ring.cells[type_idx];
                    let first_idx = advance_pos(ring, type_idx, &mut crossings);

                    match record_type {
                        METADATA_TYPE_FONT => {
                            let font = unbias(ring.cells[first_idx]);
                            self.state.attrs.font = font;
                            if include_metadata {
                                self.sink.set_font(font);
                            }
                            pos = advance_pos(ring, first_idx, &mut crossings);
                        }
                        METADATA_TYPE_STYLE => {
                            let style = unbias(ring.cells[first_idx]);
                            self.state.attrs.style = style;
                            if include_metadata {
                                self.sink.set_style(style);
                            }
                            pos = advance_pos(ring, first_idx, &mut crossings);
                        }
                        METADATA_TYPE_COLOUR => {
                            let second_idx = advance_pos(ring, first_idx, &mut crossings);
                            let foreground = unbias(ring.cells[first_idx]);
                            let background = unbias(ring.cells[second_idx]);
                            self.state.attrs.foreground = foreground;
                            self.state.attrs.background = background;
                            if include_metadata {
                                self.sink.set_colour(foreground, background, true);
                            }
                            pos = advance_pos(ring, second_idx, &mut crossings);
                        }
                        METADATA_TYPE_PARAGRAPH_ATTRIBUTE => {
                            self.state.last_paragraph_attribute_index = Some(first_idx);
                            let second_idx = advance_pos(ring, first_idx, &mut crossings);
                            pos = advance_pos(ring, second_idx, &mut crossings);
                        }
                        _ => {
                            error!("inconsistent metadata while replaying history");
                            return Err(HistoryError::InconsistentMetadata);
                        }
                    }

                    moved = true;
                    continue;
                }

                if cell == UCS_NEWLINE {
                    n -= 1;
                    if n < 1 {
                        // The closing newline itself is not replayed.
                        if !buf.is_empty() {
                            self.sink.emit_text(&buf);
                            buf.clear();
                        }
                        break;
                    }
                }

                buf.push(cell);
                if buf.len() == REPLAY_BUF_SIZE {
                    self.sink.emit_text(&buf);
                    buf.clear();
                }

                pos = advance_pos(ring, pos, &mut crossings);
                moved = true;
            }
        }

        if advance {
            self.state.wraps += crossings;
            if moved {
                self.state.lap_behind_front = false;
            }

            if pos == ring.front {
                self.state.position = pos;
                self.state.first_iteration_done = false;
                self.state.newline_terminated = ring.cells[pos] == UCS_NEWLINE;
            } else {
                let next = ring.step_forward(pos);
                if next == 0 {
                    self.state.wraps += 1;
                }
                self.state.position = next;
            }
        }

        Ok(n)
    }

    /// Rewrites the parameters of the paragraph-attribute record most
    /// recently seen by [`Self::replay`], in place.
    ///
    /// Always performs the epoch check, `SKIP_VALIDATION` notwithstanding:
    /// this writes into the ring.
    ///
    /// # Errors
    /// `CursorInvalidated`, `NoParagraphAttributeSeen`, or
    /// `InvalidParameter`.
    pub fn set_last_paragraph_attrs(
        &mut self,
        history: &mut OutputHistory,
        attr1: i16,
        attr2: i16,
    ) -> Result<(), HistoryError> {
        self.validate(history)?;

        MetadataRecord::ParagraphAttribute(attr1, attr2).validate()?;

        let Some(idx) = self.state.last_paragraph_attribute_index else {
            return Err(HistoryError::NoParagraphAttributeSeen);
        };

        trace!("altering paragraph attributes to {attr1} and {attr2}");

        let ring = history.ring_mut();
        ring.cells[idx] = bias(attr1);
        let next = ring.step_forward(idx);
        ring.cells[next] = bias(attr2);

        Ok(())
    }

    /// Snapshots the complete walk state.
    ///
    /// # Errors
    /// `CursorInvalidated`.
    pub fn remember(&mut self, history: &OutputHistory) -> Result<(), HistoryError> {
        self.check(history)?;

        self.saved = Some(self.state);
        Ok(())
    }

    /// Rewrites the walk state from the last snapshot. Does not re-check
    /// the epoch; pairing saves with restores inside a quiescent stretch
    /// is the caller's contract.
    ///
    /// # Errors
    /// `NoSavedPosition` if nothing was remembered.
    pub fn restore(&mut self) -> Result<(), HistoryError> {
        let Some(saved) = self.saved else {
            return Err(HistoryError::NoSavedPosition);
        };

        self.state = saved;
        Ok(())
    }

    /// Rebuilds the attribute state active at the cursor's position by
    /// scanning backward until a record has been seen for each of font,
    /// style and colour, or the buffer end is reached. The result is
    /// cached per state block.
    fn evaluate_metadata(&mut self, history: &OutputHistory) -> Result<(), HistoryError> {
        self.check(history)?;

        if self.state.metadata_evaluated {
            return Ok(());
        }

        let ring = history.ring();
        let block_idx = self.state.position - (self.state.position % history.state_block_size());

        if let Some((cached_idx, cached_attrs)) = self.state.cached_block {
            if cached_idx == block_idx {
                trace!("re-using attribute state for block {block_idx}");
                self.state.attrs = cached_attrs;
                self.state.metadata_evaluated = true;
                return Ok(());
            }
        }

        trace!("reconstructing attribute state at offset {}", self.state.position);

        let mut font: Option<ZFont> = None;
        let mut style: Option<ZStyle> = None;
        let mut foreground: Option<ZColour> = None;
        let mut background: Option<ZColour> = None;

        let mut idx = self.state.position;
        let mut wraps = self.state.wraps;
        let mut last: Option<usize> = None;
        let mut last2: Option<usize> = None;
        let mut last3: Option<usize> = None;

        while font.is_none() || style.is_none() || foreground.is_none() || background.is_none() {
            last3 = last2;
            last2 = last;
            last = Some(idx);

            let Some(next) = ring.step_backward(idx, &mut wraps) else {
                // Nothing older retained; font and style fall back to the
                // state at the buffer back, colours to the window's current
                // configuration.
                if font.is_none() {
                    font = Some(history.back_attrs().font);
                }
                if style.is_none() {
                    style = Some(history.back_attrs().style);
                }
                if foreground.is_none() {
                    foreground = Some(history.front_attrs().foreground);
                }
                if background.is_none() {
                    background = Some(history.front_attrs().background);
                }
                break;
            };
            idx = next;

            if ring.cells[idx] == METADATA_ESCAPE {
                let (Some(type_idx), Some(first_idx)) = (last, last2) else {
                    return Err(HistoryError::InconsistentMetadata);
                };
                let record_type = ring.cells[type_idx];

                if record_type == METADATA_TYPE_FONT && font.is_none() {
                    font = Some(unbias(ring.cells[first_idx]));
                } else if record_type == METADATA_TYPE_STYLE && style.is_none() {
                    style = Some(unbias(ring.cells[first_idx]));
                } else if record_type == METADATA_TYPE_COLOUR
                    && (foreground.is_none() || background.is_none())
                {
                    let Some(second_idx) = last3 else {
                        return Err(HistoryError::InconsistentMetadata);
                    };
                    foreground = Some(unbias(ring.cells[first_idx]));
                    background = Some(unbias(ring.cells[second_idx]));
                }
            }
        }

        let (Some(font), Some(style), Some(foreground), Some(background)) =
            (font, style, foreground, background)
        else {
            return Err(HistoryError::InconsistentMetadata);
        };

        let attrs = TextAttributes::new(font, style, foreground, background);
        self.state.attrs = attrs;
        self.state.cached_block = Some((block_idx, attrs));
        self.state.metadata_evaluated = true;

        Ok(())
    }

    fn check(&self, history: &OutputHistory) -> Result<(), HistoryError> {
        if self.validation_disabled {
            return Ok(());
        }

        self.validate(history)
    }

    fn validate(&self, history: &OutputHistory) -> Result<(), HistoryError> {
        let ring = history.ring();

        if ring.wraps == self.snapshot_wraps && ring.front == self.snapshot_front {
            Ok(())
        } else {
            warn!("history cursor used after the history was written to");
            Err(HistoryError::CursorInvalidated)
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn clamp_chars(chars: i64) -> usize {
    if chars < 0 {
        0
    } else {
        chars as usize
    }
}
