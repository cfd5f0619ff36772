// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::attributes::TextAttributes;

/// Per-window history settings.
///
/// The buffer starts empty and grows in `buffer_increment_size` steps until
/// it reaches `maximum_buffer_size`; after that the oldest output is
/// overwritten. Sizes are in code units, not bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HistoryConfig {
    pub maximum_buffer_size: usize,
    pub buffer_increment_size: usize,
    /// Attributes in effect before the window produces any output.
    pub initial: TextAttributes,
}

impl HistoryConfig {
    #[must_use]
    pub const fn new(
        maximum_buffer_size: usize,
        buffer_increment_size: usize,
        initial: TextAttributes,
    ) -> Self {
        Self {
            maximum_buffer_size,
            buffer_increment_size,
            initial,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            maximum_buffer_size: 65536,
            buffer_increment_size: 4096,
            initial: TextAttributes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_bounded_and_incremental() {
        let cfg = HistoryConfig::default();
        assert!(cfg.buffer_increment_size > 0);
        assert!(cfg.maximum_buffer_size >= cfg.buffer_increment_size);
    }
}
