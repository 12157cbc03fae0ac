use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{sort_newest_first, NewPost, Post, PostFilter, PostId, PostRepository, StoreError};
use crate::lifecycle::LifecycleState;

#[derive(Debug, Default)]
struct Inner {
    next_id: PostId,
    posts: HashMap<PostId, Post>,
}

/// Process-local store. Used by tests and by the `memory` storage backend.
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    inner: RwLock<Inner>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let post = Post {
            id: inner.next_id,
            title: post.title().to_string(),
            content: post.content().to_string(),
            state: LifecycleState::Created,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn update_content(&self, id: PostId, post: NewPost) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.posts.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        stored.title = post.title().to_string();
        stored.content = post.content().to_string();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn transition(
        &self,
        id: PostId,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.posts.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        if stored.state != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual: stored.state,
            });
        }
        stored.state = next;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|post| filter.matches(post.state))
            .cloned()
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost::new(title, "content").unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_initial_state() {
        let repo = InMemoryPostRepository::new();
        let first = repo.create(new_post("first")).await.unwrap();
        let second = repo.create(new_post("second")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.state, LifecycleState::Created);
        assert_eq!(repo.find(2).await.unwrap(), Some(second));
        assert_eq!(repo.find(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = InMemoryPostRepository::new();
        let post = repo.create(new_post("post")).await.unwrap();

        let moved = repo
            .transition(post.id, LifecycleState::Created, LifecycleState::AiVerified)
            .await
            .unwrap();
        assert_eq!(moved.state, LifecycleState::AiVerified);

        // A second writer still expecting `created` loses.
        let err = repo
            .transition(post.id, LifecycleState::Created, LifecycleState::Deleted)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: LifecycleState::Created,
                actual: LifecycleState::AiVerified,
                ..
            }
        ));
        assert_eq!(
            repo.find(post.id).await.unwrap().unwrap().state,
            LifecycleState::AiVerified
        );
    }

    #[tokio::test]
    async fn test_missing_post() {
        let repo = InMemoryPostRepository::new();
        let err = repo
            .transition(7, LifecycleState::Created, LifecycleState::Deleted)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 7 }));

        let err = repo.update_content(7, new_post("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 7 }));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let repo = InMemoryPostRepository::new();
        let a = repo.create(new_post("a")).await.unwrap();
        let b = repo.create(new_post("b")).await.unwrap();
        repo.transition(a.id, LifecycleState::Created, LifecycleState::Deleted)
            .await
            .unwrap();

        let active = repo.list(PostFilter::Active).await.unwrap();
        assert_eq!(active.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id]);

        let all = repo.list(PostFilter::All).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id, a.id]);
    }
}
