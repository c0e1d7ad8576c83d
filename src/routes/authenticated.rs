use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Endpoints that act on behalf of the logged-in caller. Every handler here
/// receives a validated `AuthUser`; ownership of the targeted bookmark is
/// checked inside the handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/bookmarks
        // Saves a bookmark owned by the caller.
        .route("/api/bookmarks", post(handlers::create_bookmark))
        // PUT/DELETE /api/bookmarks/{bookmarkId}
        // Edits or removes one of the caller's own bookmarks.
        .route(
            "/api/bookmarks/{bookmarkId}",
            put(handlers::update_bookmark).delete(handlers::delete_bookmark),
        )
        // DELETE /api/users
        // Deletes the caller's account together with all of their bookmarks.
        .route("/api/users", delete(handlers::delete_account))
}
