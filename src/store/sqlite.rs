use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{NewPost, Post, PostFilter, PostId, PostRepository, StoreError};
use crate::lifecycle::LifecycleState;

/// SQLite-backed store (enabled with the `database` feature)
#[derive(Debug, Clone)]
pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    /// Open (creating if needed) the database and run embedded migrations
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        auto_migrate: bool,
    ) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::Database(e.into()))?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn shutdown(&self) {
        info!("Closing database connections");
        self.pool.close().await;
    }

    async fn fetch(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, state, created_at, updated_at
            FROM posts
            WHERE id = ?1
            "#,
        )
        .bind(id as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| post_from_row(&row)).transpose()
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            reason: format!("bad timestamp {raw:?}: {e}"),
        })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, StoreError> {
    let id: i64 = row.try_get("id")?;
    let state: String = row.try_get("state")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Post {
        id: id as PostId,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        state: state.parse().map_err(|e: crate::lifecycle::UnknownState| {
            StoreError::Corrupt {
                reason: e.to_string(),
            }
        })?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(post.title())
        .bind(post.content())
        .bind(LifecycleState::Created.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid() as PostId;
        self.fetch(id).await?.ok_or(StoreError::NotFound { id })
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.fetch(id).await
    }

    async fn update_content(&self, id: PostId, post: NewPost) -> Result<Post, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET title = ?1, content = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(post.title())
        .bind(post.content())
        .bind(Utc::now().to_rfc3339())
        .bind(id as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        self.fetch(id).await?.ok_or(StoreError::NotFound { id })
    }

    async fn transition(
        &self,
        id: PostId,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<Post, StoreError> {
        // The state guard in the WHERE clause makes this a single atomic
        // compare-and-set.
        let result = sqlx::query(
            r#"
            UPDATE posts SET state = ?1, updated_at = ?2
            WHERE id = ?3 AND state = ?4
            "#,
        )
        .bind(next.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id as i64)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch(id).await? {
                Some(current) => Err(StoreError::Conflict {
                    id,
                    expected,
                    actual: current.state,
                }),
                None => Err(StoreError::NotFound { id }),
            };
        }
        self.fetch(id).await?.ok_or(StoreError::NotFound { id })
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError> {
        let states = filter.states();
        let placeholders = (1..=states.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, title, content, state, created_at, updated_at \
             FROM posts WHERE state IN ({placeholders}) \
             ORDER BY created_at DESC, id DESC"
        );

        let mut query = sqlx::query(&sql);
        for state in &states {
            query = query.bind(state.as_str());
        }

        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(post_from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqlitePostRepository {
        // One connection: every in-memory connection is its own database.
        SqlitePostRepository::connect("sqlite::memory:", 1, true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repo().await;
        let post = repo
            .create(NewPost::new("Title", "Body").unwrap())
            .await
            .unwrap();

        assert_eq!(post.state, LifecycleState::Created);
        assert_eq!(repo.find(post.id).await.unwrap(), Some(post));
    }

    #[tokio::test]
    async fn test_transition_conflict() {
        let repo = repo().await;
        let post = repo
            .create(NewPost::new("Title", "Body").unwrap())
            .await
            .unwrap();

        repo.transition(post.id, LifecycleState::Created, LifecycleState::AiVerified)
            .await
            .unwrap();
        let err = repo
            .transition(post.id, LifecycleState::Created, LifecycleState::Deleted)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict {
                actual: LifecycleState::AiVerified,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_list_pending_review() {
        let repo = repo().await;
        let a = repo.create(NewPost::new("a", "x").unwrap()).await.unwrap();
        let b = repo.create(NewPost::new("b", "x").unwrap()).await.unwrap();
        repo.transition(b.id, LifecycleState::Created, LifecycleState::Deleted)
            .await
            .unwrap();

        let pending = repo.list(PostFilter::PendingReview).await.unwrap();
        assert_eq!(pending.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id]);
    }
}
