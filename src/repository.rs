use crate::{
    errors::RepositoryError,
    models::{Bookmark, PopulatedBookmark, User},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract behind every handler. Implementations perform no
/// validation: callers have already checked existence, ownership and content
/// shape before reaching this layer. Storage failures are returned as-is.
///
/// **Send + Sync + async_trait** are required to share the trait object
/// (`Arc<dyn Repository>`) across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Bookmarks ---
    /// Creates a bookmark stamped with a single `now` for both dates.
    async fn add_one(&self, author_id: Uuid, content: String)
    -> Result<PopulatedBookmark, RepositoryError>;
    async fn find_one(&self, bookmark_id: Uuid)
    -> Result<Option<PopulatedBookmark>, RepositoryError>;
    /// Every bookmark, most recently modified first.
    async fn find_all(&self) -> Result<Vec<PopulatedBookmark>, RepositoryError>;
    /// Fails with `UserNotFound` when the username resolves to nobody.
    async fn find_all_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<PopulatedBookmark>, RepositoryError>;
    /// Replaces the content and refreshes `date_modified`.
    async fn update_one(
        &self,
        bookmark_id: Uuid,
        content: String,
    ) -> Result<PopulatedBookmark, RepositoryError>;
    /// Returns true if a bookmark was removed.
    async fn delete_one(&self, bookmark_id: Uuid) -> Result<bool, RepositoryError>;
    /// Removes every bookmark owned by `author_id`. Used when an account goes away.
    async fn delete_many(&self, author_id: Uuid) -> Result<(), RepositoryError>;

    // --- Users (read side of the account module) ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, RepositoryError>;
    async fn create_user(&self, username: String) -> Result<User, RepositoryError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PopulatedBookmarkRow
///
/// One row of the bookmarks/users join. Flattened here, folded into a
/// `PopulatedBookmark` before leaving the repository.
#[derive(FromRow)]
struct PopulatedBookmarkRow {
    id: Uuid,
    author_id: Uuid,
    author_username: String,
    content: String,
    date_created: DateTime<Utc>,
    date_modified: DateTime<Utc>,
}

impl From<PopulatedBookmarkRow> for PopulatedBookmark {
    fn from(row: PopulatedBookmarkRow) -> Self {
        PopulatedBookmark {
            id: row.id,
            author: User {
                id: row.author_id,
                username: row.author_username,
            },
            content: row.content,
            date_created: row.date_created,
            date_modified: row.date_modified,
        }
    }
}

// Shared projection for every read that resolves the author.
const SELECT_POPULATED: &str = r#"
    SELECT
        b.id, b.author_id, u.username AS author_username,
        b.content, b.date_created, b.date_modified
    FROM bookmarks b
    JOIN users u ON b.author_id = u.id
"#;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_populated(&self, id: Uuid) -> Result<Option<PopulatedBookmark>, RepositoryError> {
        let query = format!("{SELECT_POPULATED} WHERE b.id = $1");
        let row = sqlx::query_as::<_, PopulatedBookmarkRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PopulatedBookmark::from))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// add_one
    ///
    /// Inserts through a CTE so the author join happens in the same round trip.
    async fn add_one(
        &self,
        author_id: Uuid,
        content: String,
    ) -> Result<PopulatedBookmark, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, PopulatedBookmarkRow>(
            r#"
            WITH inserted AS (
                INSERT INTO bookmarks (id, author_id, content, date_created, date_modified)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id, author_id, content, date_created, date_modified
            )
            SELECT
                i.id, i.author_id, u.username AS author_username,
                i.content, i.date_created, i.date_modified
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::AuthorNotFound(author_id)
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(row.into())
    }

    async fn find_one(&self, bookmark_id: Uuid) -> Result<Option<PopulatedBookmark>, RepositoryError> {
        self.fetch_populated(bookmark_id).await
    }

    async fn find_all(&self) -> Result<Vec<PopulatedBookmark>, RepositoryError> {
        let query = format!("{SELECT_POPULATED} ORDER BY b.date_modified DESC");
        let rows = sqlx::query_as::<_, PopulatedBookmarkRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PopulatedBookmark::from).collect())
    }

    /// find_all_by_username
    ///
    /// Resolves the author first so an unknown username is an error rather
    /// than an empty list.
    async fn find_all_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<PopulatedBookmark>, RepositoryError> {
        let author = self
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| RepositoryError::UserNotFound(username.to_string()))?;

        let query = format!("{SELECT_POPULATED} WHERE b.author_id = $1 ORDER BY b.date_modified DESC");
        let rows = sqlx::query_as::<_, PopulatedBookmarkRow>(&query)
            .bind(author.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PopulatedBookmark::from).collect())
    }

    async fn update_one(
        &self,
        bookmark_id: Uuid,
        content: String,
    ) -> Result<PopulatedBookmark, RepositoryError> {
        // GREATEST keeps date_modified >= date_created even if clocks disagree.
        let updated = sqlx::query(
            r#"
            UPDATE bookmarks
            SET content = $2,
                date_modified = GREATEST($3, date_created)
            WHERE id = $1
            "#,
        )
        .bind(bookmark_id)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::BookmarkNotFound(bookmark_id));
        }

        self.fetch_populated(bookmark_id)
            .await?
            .ok_or(RepositoryError::BookmarkNotFound(bookmark_id))
    }

    async fn delete_one(&self, bookmark_id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(bookmark_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_many(&self, author_id: Uuid) -> Result<(), RepositoryError> {
        let res = sqlx::query("DELETE FROM bookmarks WHERE author_id = $1")
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(%author_id, removed = res.rows_affected(), "bookmarks removed for author");
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, username: String) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username) VALUES ($1, $2) RETURNING id, username",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// InMemoryRepository
///
/// A process-local implementation of `Repository` used by the handler and
/// router tests, so the full request pipeline can run without a database.
/// Never fails with `RepositoryError::Database`.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<InMemoryTables>,
}

#[derive(Default)]
struct InMemoryTables {
    users: HashMap<Uuid, User>,
    bookmarks: HashMap<Uuid, Bookmark>,
}

impl InMemoryTables {
    fn populate(&self, bookmark: &Bookmark) -> Option<PopulatedBookmark> {
        let author = self.users.get(&bookmark.author_id)?.clone();
        Some(PopulatedBookmark::new(bookmark.clone(), author))
    }

    fn populate_sorted<'a>(&self, bookmarks: impl Iterator<Item = &'a Bookmark>) -> Vec<PopulatedBookmark> {
        let mut out: Vec<PopulatedBookmark> = bookmarks.filter_map(|b| self.populate(b)).collect();
        out.sort_by(|a, b| b.date_modified.cmp(&a.date_modified));
        out
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn add_one(
        &self,
        author_id: Uuid,
        content: String,
    ) -> Result<PopulatedBookmark, RepositoryError> {
        let now = Utc::now();
        let bookmark = Bookmark {
            id: Uuid::new_v4(),
            author_id,
            content,
            date_created: now,
            date_modified: now,
        };

        let mut tables = self.inner.write().await;
        // Same outcome as the foreign key on bookmarks.author_id.
        let author = tables
            .users
            .get(&author_id)
            .cloned()
            .ok_or(RepositoryError::AuthorNotFound(author_id))?;
        tables.bookmarks.insert(bookmark.id, bookmark.clone());
        Ok(PopulatedBookmark::new(bookmark, author))
    }

    async fn find_one(&self, bookmark_id: Uuid) -> Result<Option<PopulatedBookmark>, RepositoryError> {
        let tables = self.inner.read().await;
        Ok(tables
            .bookmarks
            .get(&bookmark_id)
            .and_then(|b| tables.populate(b)))
    }

    async fn find_all(&self) -> Result<Vec<PopulatedBookmark>, RepositoryError> {
        let tables = self.inner.read().await;
        Ok(tables.populate_sorted(tables.bookmarks.values()))
    }

    async fn find_all_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<PopulatedBookmark>, RepositoryError> {
        let tables = self.inner.read().await;
        let author_id = tables
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
            .ok_or_else(|| RepositoryError::UserNotFound(username.to_string()))?;

        Ok(tables.populate_sorted(
            tables
                .bookmarks
                .values()
                .filter(|b| b.author_id == author_id),
        ))
    }

    async fn update_one(
        &self,
        bookmark_id: Uuid,
        content: String,
    ) -> Result<PopulatedBookmark, RepositoryError> {
        let mut tables = self.inner.write().await;
        let bookmark = tables
            .bookmarks
            .get_mut(&bookmark_id)
            .ok_or(RepositoryError::BookmarkNotFound(bookmark_id))?;
        bookmark.content = content;
        bookmark.date_modified = Utc::now().max(bookmark.date_created);
        let bookmark = bookmark.clone();

        tables
            .populate(&bookmark)
            .ok_or(RepositoryError::BookmarkNotFound(bookmark_id))
    }

    async fn delete_one(&self, bookmark_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.inner.write().await.bookmarks.remove(&bookmark_id).is_some())
    }

    async fn delete_many(&self, author_id: Uuid) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .bookmarks
            .retain(|_, b| b.author_id != author_id);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, username: String) -> Result<User, RepositoryError> {
        let user = User {
            id: Uuid::new_v4(),
            username,
        };
        self.inner.write().await.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.inner.write().await;
        let removed = tables.users.remove(&id).is_some();
        // Same effect as ON DELETE CASCADE.
        tables.bookmarks.retain(|_, b| b.author_id != id);
        Ok(removed)
    }
}
