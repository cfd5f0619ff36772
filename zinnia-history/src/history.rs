// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use zinnia_common::{
    attributes::{TextAttributes, ZFont, ZStyle},
    chars::{Uch, UCS_NEWLINE},
    colors::ZColour,
    config::HistoryConfig,
};

use crate::{
    error::HistoryError,
    metadata::{
        unbias, MetadataRecord, MAX_RECORD_LEN, METADATA_ESCAPE, METADATA_TYPE_COLOUR,
        METADATA_TYPE_FONT, METADATA_TYPE_PARAGRAPH_ATTRIBUTE, METADATA_TYPE_STYLE,
        STATE_BLOCK_SIZE,
    },
    ring::Ring,
};

/// Called when a paragraph-attribute record leaves the ring, so a renderer
/// can release whatever layout it cached for that paragraph.
pub type ParagraphRemovalCallback = Box<dyn FnMut(i16, i16)>;

/// The append side of one window's output history.
///
/// Characters and attribute changes go in at the front; once the ring is
/// full the oldest output is evicted to make room. While evicting, the
/// writer keeps a running "back-side" copy of the attribute state so a
/// cursor starting at the oldest character still knows what was active
/// there.
pub struct OutputHistory {
    window: usize,

    ring: Ring,

    /// Attributes as the interpreter last set them; what new output will
    /// carry.
    front_attrs: TextAttributes,

    /// Attributes in effect at the oldest retained character, advanced as
    /// metadata records are evicted.
    back_attrs: TextAttributes,

    /// Last state-block boundary a font/style/colour triple was written
    /// for.
    last_block_idx: usize,

    /// Offset of the newline closing the oldest complete paragraph, if it
    /// has been located. Used to fire the paragraph-removal callback once
    /// per paragraph-attribute record instead of once per eviction batch.
    next_newline_after_back: Option<usize>,

    paragraph_removal: Option<ParagraphRemovalCallback>,

    state_block_size: usize,
}

impl OutputHistory {
    /// Creates the history for `window`.
    ///
    /// The configured maximum is raised to [`MAX_RECORD_LEN`] if it is
    /// below it; every metadata record must fit in the ring whole.
    #[must_use]
    pub fn new(window: usize, config: &HistoryConfig) -> Self {
        Self {
            window,
            ring: Ring::new(
                config.maximum_buffer_size.max(MAX_RECORD_LEN),
                config.buffer_increment_size,
            ),
            front_attrs: config.initial,
            back_attrs: config.initial,
            last_block_idx: 0,
            next_newline_after_back: None,
            paragraph_removal: None,
            state_block_size: STATE_BLOCK_SIZE,
        }
    }

    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Current allocation, in code units.
    #[must_use]
    pub const fn allocated_size(&self) -> usize {
        self.ring.capacity()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn set_paragraph_removal_callback<F>(&mut self, callback: F)
    where
        F: FnMut(i16, i16) + 'static,
    {
        self.paragraph_removal = Some(Box::new(callback));
    }

    pub fn clear_paragraph_removal_callback(&mut self) {
        self.paragraph_removal = None;
    }

    /// Appends interpreter output.
    ///
    /// `text` must not contain the metadata escape value `0`; interpreter
    /// output never does.
    ///
    /// # Errors
    /// `InconsistentMetadata` if eviction trips over a corrupt record.
    pub fn put_text(&mut self, text: &[Uch]) -> Result<(), HistoryError> {
        debug_assert!(
            !text.contains(&METADATA_ESCAPE),
            "output text may not contain the metadata escape"
        );

        if text.is_empty() {
            return Ok(());
        }

        self.store(text, true)
    }

    /// # Errors
    /// `InvalidParameter` if `font` is below the encodable floor.
    pub fn put_font(&mut self, font: ZFont) -> Result<(), HistoryError> {
        self.put_record(MetadataRecord::Font(font))
    }

    /// # Errors
    /// `InvalidParameter` if `style` is below the encodable floor.
    pub fn put_style(&mut self, style: ZStyle) -> Result<(), HistoryError> {
        self.put_record(MetadataRecord::Style(style))
    }

    /// # Errors
    /// `InvalidParameter` unless both components lie in the colour domain
    /// `[-2, 15]`.
    pub fn put_colour(
        &mut self,
        foreground: ZColour,
        background: ZColour,
    ) -> Result<(), HistoryError> {
        self.put_record(MetadataRecord::Colour(foreground, background))
    }

    /// # Errors
    /// `InvalidParameter` if either attribute is below the encodable floor.
    pub fn put_paragraph_attr(&mut self, attr1: i16, attr2: i16) -> Result<(), HistoryError> {
        self.put_record(MetadataRecord::ParagraphAttribute(attr1, attr2))
    }

    /// Walks the front back over `nof_chars` logical characters, dropping
    /// them from the history. Metadata records crossed on the way count
    /// zero toward `nof_chars`. Used to take preloaded input back out.
    ///
    /// # Errors
    /// `AtOldest` if fewer than `nof_chars` characters are retained; the
    /// history is left untouched.
    pub fn remove_trailing(&mut self, nof_chars: usize) -> Result<(), HistoryError> {
        if nof_chars == 0 {
            return Ok(());
        }

        trace!("removing {nof_chars} trailing chars from window {}", self.window);

        let mut remaining = nof_chars;
        let mut crossings: u32 = 0;
        let mut last_cell = METADATA_ESCAPE;
        let mut walk: Option<(usize, u32)> = None;

        while remaining > 0 {
            let next = match walk {
                None => self.ring.front_walk_start(),
                Some((pos, mut budget)) => {
                    let stepped = self.ring.step_backward(pos, &mut budget);
                    if pos == 0 && stepped.is_some() {
                        crossings += 1;
                    }
                    stepped.map(|p| (p, budget))
                }
            };
            let Some((pos, budget)) = next else {
                return Err(HistoryError::AtOldest);
            };
            if walk.is_none() && self.ring.wraps > 0 && self.ring.front == 0 {
                crossings += 1;
            }
            walk = Some((pos, budget));

            let cell = self.ring.cells[pos];
            if cell == METADATA_ESCAPE && last_cell != METADATA_ESCAPE {
                // The cells of this record were miscounted as text on the
                // way down; refund them so the record contributes nothing.
                let record_len = MetadataRecord::len_for_type(last_cell).unwrap_or(3);
                remaining += record_len - 1;
            } else {
                last_cell = cell;
                remaining -= 1;
            }
        }

        if let Some((pos, _)) = walk {
            self.ring.front = pos;
            self.ring.wraps = self.ring.wraps.saturating_sub(crossings);
        }

        Ok(())
    }

    pub(crate) const fn ring(&self) -> &Ring {
        &self.ring
    }

    pub(crate) fn ring_mut(&mut self) -> &mut Ring {
        &mut self.ring
    }

    pub(crate) const fn front_attrs(&self) -> TextAttributes {
        self.front_attrs
    }

    pub(crate) const fn back_attrs(&self) -> TextAttributes {
        self.back_attrs
    }

    pub(crate) const fn state_block_size(&self) -> usize {
        self.state_block_size
    }

    #[cfg(test)]
    pub(crate) fn set_state_block_size(&mut self, size: usize) {
        self.state_block_size = size;
    }

    fn put_record(&mut self, record: MetadataRecord) -> Result<(), HistoryError> {
        record.validate()?;

        match record {
            MetadataRecord::Font(font) => self.front_attrs.font = font,
            MetadataRecord::Style(style) => self.front_attrs.style = style,
            MetadataRecord::Colour(foreground, background) => {
                self.front_attrs.foreground = foreground;
                self.front_attrs.background = background;
            }
            MetadataRecord::ParagraphAttribute(..) => {}
        }

        self.emit_record(record)
    }

    /// Encodes and appends a record without touching the front-side state.
    /// State blocks are disabled for the nested append so a record can
    /// never be torn apart by another record.
    fn emit_record(&mut self, record: MetadataRecord) -> Result<(), HistoryError> {
        let mut encoded = [0; MAX_RECORD_LEN];
        let len = record.encode(&mut encoded);
        self.store(&encoded[..len], false)
    }

    fn store(&mut self, data: &[Uch], evaluate_state_block: bool) -> Result<(), HistoryError> {
        let mut data = data;

        trace!(
            "storing {} code units in window {} history",
            data.len(),
            self.window
        );

        if data.len() >= self.ring.max {
            // The input alone fills every cell we are allowed to allocate.
            // Retire the entire current content, then keep the input's
            // suffix.
            self.evict_back(self.ring.space_used())?;

            if self.ring.capacity() < self.ring.max {
                self.ring.try_grow(self.ring.max);
            }

            let cap = self.ring.capacity();
            if cap == 0 {
                return Ok(());
            }

            let suffix = &data[data.len() - cap..];
            self.ring.cells[..cap].copy_from_slice(suffix);
            self.ring.front = 0;
            self.ring.back = 0;
            self.ring.wraps = self.ring.wraps.wrapping_add(1);
            if self.ring.wraps == 0 {
                self.ring.wraps = 1;
            }
            self.next_newline_after_back = None;
        } else {
            let mut len = data.len();

            let space_available = self.ring.space_available();
            if space_available < len {
                let missing = len - space_available;
                let increment = self.ring.grow.max(1);
                let new_size = self.ring.capacity() + missing.div_ceil(increment) * increment;
                let desired = new_size.min(self.ring.max);

                if desired > self.ring.capacity() {
                    self.ring.try_grow(desired);
                }
            }

            if self.ring.capacity() < len {
                data = &data[len - self.ring.capacity()..];
                len = self.ring.capacity();
            }

            if len == 0 {
                return Ok(());
            }

            if self.ring.wraps == 0 {
                let tail = self.ring.capacity() - self.ring.front;
                let batch = tail.min(len);

                if batch > 0 {
                    let front = self.ring.front;
                    self.ring.cells[front..front + batch].copy_from_slice(&data[..batch]);
                    self.ring.front += batch;
                }

                data = &data[batch..];
                len -= batch;

                if self.ring.front == self.ring.capacity() {
                    trace!("window {} history entering wrap-around mode", self.window);
                    self.ring.front = 0;
                    self.ring.wraps = 1;
                }

                if len == 0 {
                    if evaluate_state_block {
                        self.write_state_block_if_necessary()?;
                    }
                    return Ok(());
                }
            }

            // Wrapped: every batch overwrites the oldest content, which has
            // to be retired first.
            while len > 0 {
                let front = self.ring.front;
                let batch = len.min(self.ring.capacity() - front);

                self.evict_back(batch)?;

                self.ring.cells[front..front + batch].copy_from_slice(&data[..batch]);
                let new_front = front + batch;
                self.ring.front = if new_front == self.ring.capacity() {
                    0
                } else {
                    new_front
                };

                data = &data[batch..];
                len -= batch;
                self.ring.back = self.ring.front;
            }
        }

        if evaluate_state_block {
            self.write_state_block_if_necessary()?;
        }

        Ok(())
    }

    /// Retires `nof_chars` cells at the back, applying evicted metadata to
    /// the back-side state and firing the paragraph-removal callback for
    /// paragraph-attribute records whose paragraph is now leaving.
    ///
    /// A record straddling the end of the range is consumed whole, so the
    /// walk may overrun by up to `MAX_RECORD_LEN - 1` cells; the ring is
    /// never smaller than a full record, so the overrun stays in bounds.
    fn evict_back(&mut self, nof_chars: usize) -> Result<(), HistoryError> {
        if nof_chars == 0 || self.ring.capacity() == 0 {
            return Ok(());
        }

        trace!(
            "retiring {nof_chars} code units at the back of window {}",
            self.window
        );

        let mut idx = self.ring.back;
        let mut remaining = nof_chars;

        while remaining > 0 {
            if self.next_newline_after_back == Some(idx) {
                self.next_newline_after_back = None;
            }

            if self.ring.cells[idx] == METADATA_ESCAPE {
                idx = self.ring.step_forward(idx);
                remaining = remaining.saturating_sub(1);

                match self.ring.cells[idx] {
                    METADATA_ESCAPE => {}
                    METADATA_TYPE_FONT => {
                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        self.back_attrs.font = unbias(self.ring.cells[idx]);
                    }
                    METADATA_TYPE_STYLE => {
                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        self.back_attrs.style = unbias(self.ring.cells[idx]);
                    }
                    METADATA_TYPE_COLOUR => {
                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        self.back_attrs.foreground = unbias(self.ring.cells[idx]);

                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        self.back_attrs.background = unbias(self.ring.cells[idx]);
                    }
                    METADATA_TYPE_PARAGRAPH_ATTRIBUTE => {
                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        let attr1 = unbias(self.ring.cells[idx]);

                        idx = self.ring.step_forward(idx);
                        remaining = remaining.saturating_sub(1);
                        let attr2 = unbias(self.ring.cells[idx]);

                        if self.next_newline_after_back.is_none() {
                            if let Some(callback) = self.paragraph_removal.as_mut() {
                                callback(attr1, attr2);
                            }
                        }
                    }
                    _ => {
                        error!("inconsistent metadata while evicting history");
                        return Err(HistoryError::InconsistentMetadata);
                    }
                }
            }

            idx = self.ring.step_forward(idx);
            remaining = remaining.saturating_sub(1);
        }

        if self.paragraph_removal.is_some() && self.next_newline_after_back.is_none() {
            // The newline guarding the previous paragraph attribute is gone.
            // Look for the next paragraph boundary so only whole paragraphs
            // count, firing the callback for any attribute records passed.
            let mut cur = idx;

            loop {
                if self.ring.cells[cur] == UCS_NEWLINE {
                    break;
                }
                if cur == self.ring.front {
                    break;
                }

                cur = self.ring.step_forward(cur);

                if self.ring.cells[cur] == METADATA_ESCAPE {
                    cur = self.ring.step_forward(cur);
                    let record_type = self.ring.cells[cur];

                    cur = self.ring.step_forward(cur);
                    let first_parameter = self.ring.cells[cur];

                    if record_type == METADATA_TYPE_PARAGRAPH_ATTRIBUTE
                        || record_type == METADATA_TYPE_COLOUR
                    {
                        cur = self.ring.step_forward(cur);

                        if record_type == METADATA_TYPE_PARAGRAPH_ATTRIBUTE {
                            let attr1 = unbias(first_parameter);
                            let attr2 = unbias(self.ring.cells[cur]);
                            if let Some(callback) = self.paragraph_removal.as_mut() {
                                callback(attr1, attr2);
                            }
                        }
                    }
                }
            }

            self.next_newline_after_back = Some(cur);
        }

        Ok(())
    }

    /// Restates the current font, style and colour as a record triple each
    /// time the front crosses a state-block boundary. A cursor landing
    /// inside the block can then rebuild full attribute state within
    /// `state_block_size + MAX_RECORD_LEN` cells, even for attribute kinds
    /// the interpreter never changes explicitly, and the restated values
    /// match the stream state at the boundary exactly.
    fn write_state_block_if_necessary(&mut self) -> Result<(), HistoryError> {
        let block_idx = self.ring.front - (self.ring.front % self.state_block_size);

        if block_idx != self.last_block_idx {
            trace!("storing attribute state block at offset {block_idx}");

            self.emit_record(MetadataRecord::Font(self.front_attrs.font))?;
            self.emit_record(MetadataRecord::Style(self.front_attrs.style))?;
            self.emit_record(MetadataRecord::Colour(
                self.front_attrs.foreground,
                self.front_attrs.background,
            ))?;
        }

        self.last_block_idx = block_idx;

        Ok(())
    }
}
