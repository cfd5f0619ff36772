// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum HistoryError {
    /// A backward walk reached the oldest retained character.
    #[error("already at the oldest retained character")]
    AtOldest,

    /// The history was written to after this cursor was opened.
    #[error("history cursor invalidated by a write")]
    CursorInvalidated,

    /// A metadata parameter lies outside the domain for its record kind.
    #[error("metadata parameter out of range: {0}")]
    InvalidParameter(&'static str),

    /// An escape record in the buffer does not decode to any known kind.
    /// This indicates a programming error or memory corruption, never a
    /// data-dependent condition.
    #[error("inconsistent metadata record in history buffer")]
    InconsistentMetadata,

    /// No paragraph-attribute record has been replayed by this cursor yet.
    #[error("no paragraph attribute record seen by this cursor")]
    NoParagraphAttributeSeen,

    /// `restore` was called without a preceding `remember`.
    #[error("no remembered cursor position to restore")]
    NoSavedPosition,

    /// The history holds no characters to walk over.
    #[error("history buffer is empty")]
    Empty,
}
