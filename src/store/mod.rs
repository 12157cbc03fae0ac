//! Record store for posts.
//!
//! The lifecycle code only ever talks to `PostRepository`. Backends assign ids
//! and timestamps; state writes go through `transition`, which is a
//! compare-and-set on the stored state.

mod file;
mod memory;
#[cfg(feature = "database")]
mod sqlite;

pub use file::FilePostRepository;
pub use memory::InMemoryPostRepository;
#[cfg(feature = "database")]
pub use sqlite::SqlitePostRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::LifecycleState;

pub type PostId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_published(&self) -> bool {
        self.state.is_published()
    }

    pub fn is_pending_review(&self) -> bool {
        self.state.is_pending_review()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must not be blank")]
pub struct ValidationError {
    pub field: &'static str,
}

/// A validated title/content pair, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() {
            return Err(ValidationError { field: "title" });
        }
        if content.trim().is_empty() {
            return Err(ValidationError { field: "content" });
        }
        Ok(Self { title, content })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Read scopes exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Active,
    Published,
    PendingReview,
}

impl PostFilter {
    pub fn matches(&self, state: LifecycleState) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Active => state.is_active(),
            PostFilter::Published => state.is_published(),
            PostFilter::PendingReview => state.is_pending_review(),
        }
    }

    /// Stored tokens selected by this filter
    pub fn states(&self) -> Vec<LifecycleState> {
        LifecycleState::ALL
            .into_iter()
            .filter(|state| self.matches(*state))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("post {id} not found")]
    NotFound { id: PostId },

    #[error("post {id} changed concurrently: expected state {expected}, found {actual}")]
    Conflict {
        id: PostId,
        expected: LifecycleState,
        actual: LifecycleState,
    },

    #[error("corrupt record store: {reason}")]
    Corrupt { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// Replace title and content. Leaves `state` alone.
    async fn update_content(&self, id: PostId, post: NewPost) -> Result<Post, StoreError>;

    /// Move `id` from `expected` to `next`, failing with `Conflict` if the
    /// stored state is no longer `expected`. All or nothing.
    async fn transition(
        &self,
        id: PostId,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<Post, StoreError>;

    /// Matching posts, newest first
    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError>;
}

/// Lets callers pick a backend at runtime (see `cli::commands::open_repository`)
#[async_trait]
impl PostRepository for Box<dyn PostRepository> {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        (**self).create(post).await
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        (**self).find(id).await
    }

    async fn update_content(&self, id: PostId, post: NewPost) -> Result<Post, StoreError> {
        (**self).update_content(id, post).await
    }

    async fn transition(
        &self,
        id: PostId,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<Post, StoreError> {
        (**self).transition(id, expected, next).await
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError> {
        (**self).list(filter).await
    }
}

/// Newest first, ties broken by id so ordering is stable
pub(crate) fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
