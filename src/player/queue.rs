// ==========================================
// QUEUE MANAGEMENT MODULE
// ==========================================
// This module owns the playback queue for the music player.
// It handles:
// - Replacing the queue with a fresh set of search results
// - Moving between tracks (next/previous), wrapping at both ends
// - Selecting a track by its video id
// - Tracking which entry is currently selected
//
// The queue never talks to the player. Callers take the returned track and
// forward it to whatever is doing playback. That keeps this module a plain
// deterministic state machine with no side effects.

use crate::youtube::search::SearchResult;

// ==========================================
// QUEUE STRUCT
// ==========================================
// Fields:
//
// items: Vec<SearchResult>
//   - Search results in relevance order, exactly as the provider returned them
//   - Replaced wholesale on every search (no merging)
//   - Empty is a valid state ("No results found")
//
// current: Option<usize>
//   - None: nothing selected yet
//   - Some(i): entry i is selected
//   - After replace() this can point past the end of a shorter list. It is
//     only ever read through clamped() or current(), which handle that.
#[derive(Debug, Default)]
pub struct Queue {
    items: Vec<SearchResult>,
    current: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Queue {
            items: Vec::new(),
            current: None,
        }
    }

    // ==========================================
    // QUEUE MANAGEMENT: replace()
    // ==========================================
    // Swaps in a new result list.
    //
    // The selection is left alone on purpose: the caller decides whether a
    // new search should also select the first entry.
    //
    // Example:
    // - Before: Items=[A, B, C, D, E, F], Current=Some(5)
    // - replace([X, Y])
    // - After: Items=[X, Y], Current=Some(5) (stale, clamped on next move)
    pub fn replace(&mut self, items: Vec<SearchResult>) {
        self.items = items;
    }

    // ==========================================
    // NAVIGATION: select_by_id()
    // ==========================================
    // Finds the first entry whose id matches and selects it.
    //
    // Returns: Option<usize>
    // - Some(index): entry found and selected
    // - None: no such id, selection unchanged
    //
    // Duplicate ids are possible (the same video can show up twice in a
    // result page); the first one wins.
    pub fn select_by_id(&mut self, id: &str) -> Option<usize> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.current = Some(index);
        Some(index)
    }

    // ==========================================
    // NAVIGATION: next()
    // ==========================================
    // Moves forward one entry, wrapping from the last entry back to the first.
    //
    // Returns: Option<SearchResult>
    // - Some(track): the newly selected entry
    // - None: queue is empty, selection unchanged
    //
    // Example flow:
    // - Items: [A, B, C], Current: Some(2)
    // - next() → Current: Some(0), returns A
    //
    // From "nothing selected" the first call lands on entry 0.
    pub fn next(&mut self) -> Option<SearchResult> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        let index = match self.clamped() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.current = Some(index);
        Some(self.items[index].clone())
    }

    // ==========================================
    // NAVIGATION: previous()
    // ==========================================
    // Moves back one entry, wrapping from the first entry to the last.
    //
    // Returns: Option<SearchResult>
    // - Some(track): the newly selected entry
    // - None: queue is empty, selection unchanged
    //
    // Both "nothing selected" and "first entry selected" go to the last entry.
    //
    // Example flow:
    // - Items: [A, B, C], Current: Some(0)
    // - previous() → Current: Some(2), returns C
    pub fn previous(&mut self) -> Option<SearchResult> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        let index = match self.clamped() {
            Some(i) if i > 0 => i - 1,
            _ => len - 1,
        };
        self.current = Some(index);
        Some(self.items[index].clone())
    }

    // Selection pulled back into range. A stale index left by replace()
    // counts as the last entry.
    fn clamped(&self) -> Option<usize> {
        let last = self.items.len().checked_sub(1)?;
        self.current.map(|i| i.min(last))
    }

    // ==========================================
    // QUEUE INSPECTION
    // ==========================================

    /// Raw selection, possibly stale after a `replace`.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The selected entry, if the selection points inside the list.
    pub fn current(&self) -> Option<&SearchResult> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn items(&self) -> &[SearchResult] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
