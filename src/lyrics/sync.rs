//! Progress-to-line synchronization
//!
//! Pure lookup over a sorted transcript: the current line is the last one
//! whose offset is at or before the playback position.

use crate::lyrics::parser::Transcript;

/// Current/next line pair for a given playback position. Empty strings
/// mean "nothing to show" at that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub current: String,
    pub next: String,
}

/// Locate the active and upcoming lines for `progress_ms`.
///
/// The transcript is assumed sorted by offset (the parser guarantees it);
/// lookup is a binary search, O(log n).
pub fn sync_at(transcript: &Transcript, progress_ms: u64) -> SyncResult {
    let lines = transcript.lines();
    // Index of the first line strictly after the position.
    let after = lines.partition_point(|l| l.offset_ms <= progress_ms);

    if after == 0 {
        return SyncResult {
            current: String::new(),
            next: lines.first().map(|l| l.text.clone()).unwrap_or_default(),
        };
    }

    SyncResult {
        current: lines[after - 1].text.clone(),
        next: lines.get(after).map(|l| l.text.clone()).unwrap_or_default(),
    }
}
