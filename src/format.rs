use chrono::{DateTime, Datelike, Utc};

use crate::models::{BookmarkResponse, PopulatedBookmark};

/// format_date
///
/// Renders a timestamp as e.g. `April 5th 2023, 3:45:00 pm`.
/// Always rendered in UTC so the same instant yields the same string on every host.
pub fn format_date(date: &DateTime<Utc>) -> String {
    format!(
        "{} {}{} {}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%Y, %-I:%M:%S %P"),
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// construct_bookmark_response
///
/// Maps a stored bookmark (author already resolved) onto the shape the frontend consumes.
pub fn construct_bookmark_response(bookmark: &PopulatedBookmark) -> BookmarkResponse {
    BookmarkResponse {
        id: bookmark.id.to_string(),
        author: bookmark.author.username.clone(),
        date_created: format_date(&bookmark.date_created),
        content: bookmark.content.clone(),
        date_modified: format_date(&bookmark.date_modified),
    }
}
