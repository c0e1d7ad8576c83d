use crate::{
    AppState,
    auth::AuthUser,
    errors::ApiError,
    format::construct_bookmark_response,
    models::{
        BookmarkContentRequest, BookmarkMutationResponse, BookmarkResponse, MessageResponse,
        PopulatedBookmark,
    },
    validation::{validate_author_filter, validate_bookmark_content},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// BookmarkFilter
///
/// Query parameters accepted by GET /api/bookmarks.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct BookmarkFilter {
    /// Username whose bookmarks should be listed. Omit to list everyone's.
    pub author: Option<String>,
}

// --- Shared checks ---

/// Loads a bookmark that the caller is about to modify, enforcing existence
/// (404) and then ownership (403). The path segment is taken raw so that a
/// malformed id reads as "does not exist" rather than a 400.
async fn load_owned_bookmark(
    state: &AppState,
    user: &AuthUser,
    raw_id: &str,
) -> Result<PopulatedBookmark, ApiError> {
    let missing =
        || ApiError::NotFound(format!("Bookmark with bookmark ID {} does not exist.", raw_id));

    let id = Uuid::parse_str(raw_id).map_err(|_| missing())?;
    let bookmark = state.repo.find_one(id).await?.ok_or_else(missing)?;

    if !bookmark.is_owned_by(user.id) {
        return Err(ApiError::Forbidden(
            "Cannot modify other users' bookmarks.".to_string(),
        ));
    }
    Ok(bookmark)
}

/// Unwraps a content body and validates it. Body rejections are turned into
/// a 400 here instead of by the extractor, so they only surface once the
/// checks that come before content have passed.
fn bookmark_content(
    payload: Result<Json<BookmarkContentRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("rejected bookmark body: {}", rejection.body_text());
        ApiError::BadRequest(
            "Request body must be a JSON object with a string content field.".to_string(),
        )
    })?;
    validate_bookmark_content(&request.content)?;
    Ok(request.content)
}

// --- Handlers ---

/// get_bookmarks
///
/// [Public Route] Lists every bookmark, newest modification first, or only the
/// bookmarks of `?author=<username>`.
#[utoipa::path(
    get,
    path = "/api/bookmarks",
    params(BookmarkFilter),
    responses(
        (status = 200, description = "Bookmarks", body = [BookmarkResponse]),
        (status = 400, description = "Empty author filter"),
        (status = 404, description = "Unknown author")
    )
)]
pub async fn get_bookmarks(
    State(state): State<AppState>,
    Query(filter): Query<BookmarkFilter>,
) -> Result<Json<Vec<BookmarkResponse>>, ApiError> {
    let bookmarks = match filter.author {
        Some(author) => {
            validate_author_filter(&author)?;
            state.repo.find_all_by_username(&author).await?
        }
        None => state.repo.find_all().await?,
    };

    Ok(Json(
        bookmarks.iter().map(construct_bookmark_response).collect(),
    ))
}

/// create_bookmark
///
/// [Authenticated Route] Saves a new bookmark owned by the caller.
#[utoipa::path(
    post,
    path = "/api/bookmarks",
    request_body = BookmarkContentRequest,
    responses(
        (status = 201, description = "Created", body = BookmarkMutationResponse),
        (status = 400, description = "Empty content or malformed body"),
        (status = 403, description = "Not logged in"),
        (status = 413, description = "Content too long")
    )
)]
pub async fn create_bookmark(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<BookmarkContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookmarkMutationResponse>), ApiError> {
    let content = bookmark_content(payload)?;

    let bookmark = state.repo.add_one(user.id, content).await?;
    tracing::info!(bookmark_id = %bookmark.id, author = %user.username, "bookmark created");

    Ok((
        StatusCode::CREATED,
        Json(BookmarkMutationResponse {
            message: "Your bookmark was created successfully.".to_string(),
            bookmark: construct_bookmark_response(&bookmark),
        }),
    ))
}

/// update_bookmark
///
/// [Authenticated Route] Replaces the content of one of the caller's bookmarks.
/// Checks run in order: existence, ownership, content.
#[utoipa::path(
    put,
    path = "/api/bookmarks/{bookmarkId}",
    params(("bookmarkId" = String, Path, description = "Bookmark ID")),
    request_body = BookmarkContentRequest,
    responses(
        (status = 200, description = "Updated", body = BookmarkMutationResponse),
        (status = 400, description = "Empty content or malformed body"),
        (status = 403, description = "Not logged in or not the author"),
        (status = 404, description = "Not Found"),
        (status = 413, description = "Content too long")
    )
)]
pub async fn update_bookmark(
    user: AuthUser,
    State(state): State<AppState>,
    Path(bookmark_id): Path<String>,
    payload: Result<Json<BookmarkContentRequest>, JsonRejection>,
) -> Result<Json<BookmarkMutationResponse>, ApiError> {
    let existing = load_owned_bookmark(&state, &user, &bookmark_id).await?;
    let content = bookmark_content(payload)?;

    let bookmark = state.repo.update_one(existing.id, content).await?;
    tracing::info!(bookmark_id = %bookmark.id, "bookmark updated");

    Ok(Json(BookmarkMutationResponse {
        message: "Your bookmark was updated successfully.".to_string(),
        bookmark: construct_bookmark_response(&bookmark),
    }))
}

/// delete_bookmark
///
/// [Authenticated Route] Deletes one of the caller's bookmarks.
#[utoipa::path(
    delete,
    path = "/api/bookmarks/{bookmarkId}",
    params(("bookmarkId" = String, Path, description = "Bookmark ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not logged in or not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_bookmark(
    user: AuthUser,
    State(state): State<AppState>,
    Path(bookmark_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let existing = load_owned_bookmark(&state, &user, &bookmark_id).await?;

    state.repo.delete_one(existing.id).await?;
    tracing::info!(bookmark_id = %existing.id, "bookmark deleted");

    Ok(Json(MessageResponse {
        message: "Your bookmark was deleted successfully.".to_string(),
    }))
}

/// delete_account
///
/// [Authenticated Route] Removes the caller's account. Their bookmarks are
/// cleared first so no bookmark is ever left without an author.
#[utoipa::path(
    delete,
    path = "/api/users",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Not logged in")
    )
)]
pub async fn delete_account(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.repo.delete_many(user.id).await?;
    state.repo.delete_user(user.id).await?;
    tracing::info!(user_id = %user.id, "account deleted with its bookmarks");

    Ok(Json(MessageResponse {
        message: "Your account has been deleted successfully.".to_string(),
    }))
}
