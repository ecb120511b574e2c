//! Cursor pagination and sidebar ordering.
//!
//! Pure functions over slices; the store calls them while holding its lock.

use super::{MessengerError, Result, DEFAULT_PAGE_SIZE};
use crate::models::{ChatSummary, Message};

/// Normalize a caller-supplied page size. Zero and negatives mean "default".
pub fn page_size(limit: i32) -> usize {
    if limit <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit as usize
    }
}

/// Return up to `limit` messages strictly before `before_id`, oldest first.
///
/// An empty `before_id` pages back from the end of the log. A non-empty one
/// that is not in the log is an error. Feeding the oldest ID of each page back
/// in as the next cursor walks the whole log without gaps or repeats.
pub fn page(log: &[Message], limit: i32, before_id: &str) -> Result<Vec<Message>> {
    let limit = page_size(limit);

    let end = if before_id.is_empty() {
        log.len()
    } else {
        log.iter()
            .position(|m| m.id == before_id)
            .ok_or_else(|| MessengerError::MessageNotFound(before_id.to_string()))?
    };
    let start = end.saturating_sub(limit);

    Ok(log[start..end].to_vec())
}

/// Sort summaries by their own activity timestamp, newest first.
pub fn sort_summaries(summaries: &mut [ChatSummary]) {
    summaries.sort_by(|a, b| b.activity_at().cmp(&a.activity_at()));
}
