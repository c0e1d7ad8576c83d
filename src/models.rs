use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The author record a bookmark points at, stored in the `users` table.
/// This module only reads users; they are owned by the account side of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

/// Bookmark
///
/// A stored bookmark, with the author still as a bare id.
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub id: Uuid,
    // FK to users.id (Owner). Never changes after creation.
    pub author_id: Uuid,
    pub content: String,
    pub date_created: DateTime<Utc>,
    // Refreshed on every edit; always >= date_created.
    pub date_modified: DateTime<Utc>,
}

/// PopulatedBookmark
///
/// A bookmark whose author reference has been resolved to the full `User`.
/// Every repository read returns this shape, since the response formatter needs
/// the author's username.
#[derive(Debug, Clone)]
pub struct PopulatedBookmark {
    pub id: Uuid,
    pub author: User,
    pub content: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl PopulatedBookmark {
    pub fn new(bookmark: Bookmark, author: User) -> Self {
        Self {
            id: bookmark.id,
            author,
            content: bookmark.content,
            date_created: bookmark.date_created,
            date_modified: bookmark.date_modified,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author.id == user_id
    }
}

// --- Request Payloads (Input Schemas) ---

/// BookmarkContentRequest
///
/// Body of both POST /api/bookmarks and PUT /api/bookmarks/{bookmarkId}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BookmarkContentRequest {
    #[schema(example = "remember to read this later")]
    pub content: String,
}

// --- Response Schemas (Output) ---

/// BookmarkResponse
///
/// The client-facing shape of a bookmark. Field names follow the frontend's
/// existing JSON contract (`_id`, camelCase dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    #[serde(rename = "_id")]
    pub id: String,
    /// Username of the author.
    pub author: String,
    #[schema(example = "April 5th 2023, 3:45:00 pm")]
    pub date_created: String,
    pub content: String,
    pub date_modified: String,
}

/// BookmarkMutationResponse
///
/// Wrapper returned by create and update: a confirmation message plus the
/// resulting bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BookmarkMutationResponse {
    pub message: String,
    pub bookmark: BookmarkResponse,
}

/// MessageResponse
///
/// Body of endpoints that only confirm an action (deletes).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
