//! Presentation state derived from the canonical bookmark collection.
//!
//! Nothing here is stored; every value is recomputed from the slice it is given.

use chrono::{DateTime, TimeZone};

use crate::services::url_normalizer::domain_key;
use crate::types::bookmark::Bookmark;
use crate::types::stats::BookmarkStats;

/// Case-insensitive substring match against title or URL.
///
/// The query is matched literally, whitespace included. An empty query
/// returns the whole collection in order.
pub fn filter_bookmarks(bookmarks: &[Bookmark], query: &str) -> Vec<Bookmark> {
    if query.is_empty() {
        return bookmarks.to_vec();
    }
    let needle = query.to_lowercase();
    bookmarks
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&needle) || b.url.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Total, distinct domains and bookmarks created on the calendar day of `now`.
///
/// The day boundary is taken in `now`'s time zone.
pub fn compute_stats<Tz: TimeZone>(bookmarks: &[Bookmark], now: &DateTime<Tz>) -> BookmarkStats {
    let today = now.date_naive();
    let tz = now.timezone();
    BookmarkStats {
        total: bookmarks.len(),
        domains: bookmarks.iter().map(|b| domain_key(&b.url)).collect(),
        today: bookmarks
            .iter()
            .filter(|b| b.created_at.with_timezone(&tz).date_naive() == today)
            .count(),
    }
}

/// Footer line, e.g. `3 of 10 bookmarks shown`.
pub fn shown_summary(shown: usize, total: usize) -> String {
    format!("{} of {} bookmarks shown", shown, total)
}
