//! Name suggestions for the character-creation screen.
//!
//! Deterministic rotation over a curated pool: every request returns the
//! next window, so repeated presses of the suggestion command cycle through
//! fresh options without ever repeating within one batch.

use std::sync::atomic::{AtomicUsize, Ordering};

const POOL: &[&str] = &[
    "Storm Runner",
    "Daybreak",
    "Iron Tempo",
    "Velvet Dash",
    "North Star",
    "Ember Mile",
    "Quiet Thunder",
    "Sable Wind",
    "Morning Tide",
    "Last Furlong",
    "Brave Meadow",
    "Silver Gate",
    "Wild Parade",
    "True Harbor",
    "Dusty Anthem",
    "Noble Sprint",
];

/// Rotating window over the name pool.
pub struct NameBook {
    cursor: AtomicUsize,
}

impl NameBook {
    pub fn new() -> Self {
        Self { cursor: AtomicUsize::new(0) }
    }

    /// The next `count` suggestions. Wraps around the pool; `count` is
    /// clamped to the pool size so a batch never repeats a name.
    pub fn next_batch(&self, count: usize) -> Vec<String> {
        let count = count.min(POOL.len());
        let start = self.cursor.fetch_add(count, Ordering::Relaxed);
        (0..count)
            .map(|i| POOL[(start + i) % POOL.len()].to_string())
            .collect()
    }
}

impl Default for NameBook {
    fn default() -> Self {
        Self::new()
    }
}
