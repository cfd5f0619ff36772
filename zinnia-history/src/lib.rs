// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded output history for interpreter windows.
//!
//! Every window keeps a circular buffer of the characters it has produced,
//! with font, style, colour and paragraph-attribute changes encoded in-band.
//! A renderer replays the history through a [`cursor::RenderSink`] to redraw
//! after a resize, to fill a scrollback view, or to repeat paragraphs with
//! the attributes they originally carried.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
// #![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod history;
pub mod metadata;
mod ring;
pub mod windows;

#[macro_use]
extern crate tracing;
