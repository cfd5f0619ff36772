// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use zinnia_common::config::HistoryConfig;

use crate::history::OutputHistory;

/// The per-window histories of one interpreter instance.
///
/// Owned by whoever drives the screen model; there is no process-wide
/// registry.
#[derive(Default)]
pub struct WindowHistories {
    windows: BTreeMap<usize, OutputHistory>,
}

impl WindowHistories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the history for `window` and returns it.
    pub fn create(&mut self, window: usize, config: &HistoryConfig) -> &mut OutputHistory {
        let history = OutputHistory::new(window, config);

        match self.windows.entry(window) {
            Entry::Occupied(mut entry) => {
                entry.insert(history);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(history),
        }
    }

    #[must_use]
    pub fn get(&self, window: usize) -> Option<&OutputHistory> {
        self.windows.get(&window)
    }

    pub fn get_mut(&mut self, window: usize) -> Option<&mut OutputHistory> {
        self.windows.get_mut(&window)
    }

    pub fn remove(&mut self, window: usize) -> Option<OutputHistory> {
        self.windows.remove(&window)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &OutputHistory)> {
        self.windows.iter().map(|(window, h)| (*window, h))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut OutputHistory)> {
        self.windows.iter_mut().map(|(window, h)| (*window, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinnia_common::chars::uchs;

    #[test]
    fn windows_are_independent() {
        let mut histories = WindowHistories::new();
        let config = HistoryConfig::default();

        histories.create(0, &config);
        histories.create(1, &config);
        assert_eq!(histories.len(), 2);

        histories
            .get_mut(0)
            .unwrap()
            .put_text(&uchs("status line\n"))
            .unwrap();

        assert!(!histories.get(0).unwrap().is_empty());
        assert!(histories.get(1).unwrap().is_empty());

        let removed = histories.remove(0).unwrap();
        assert_eq!(removed.window(), 0);
        assert_eq!(histories.len(), 1);
        assert!(histories.get(0).is_none());
    }
}
