use std::sync::Arc;
use tracing::info;

use crate::lifecycle::{AiVerification, LifecycleError, LifecycleManager, LifecycleState};
use crate::moderation::ModerationOrchestrator;
use crate::store::{NewPost, Post, PostFilter, PostId, PostRepository};

/// Id-based operations for front ends.
///
/// Each call loads the post, hands it to the `LifecycleManager` and returns
/// the new state or a typed failure that is safe to show to a user.
pub struct PostService<R: PostRepository> {
    repository: Arc<R>,
    manager: LifecycleManager<R>,
}

impl<R: PostRepository> PostService<R> {
    pub fn new(repository: R, orchestrator: Arc<ModerationOrchestrator>) -> Self {
        let repository = Arc::new(repository);
        let manager = LifecycleManager::new(Arc::clone(&repository), orchestrator);
        Self {
            repository,
            manager,
        }
    }

    pub fn manager(&self) -> &LifecycleManager<R> {
        &self.manager
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, LifecycleError> {
        let post = self.repository.create(NewPost::new(title, content)?).await?;
        info!(post_id = post.id, "Post created");
        Ok(post)
    }

    /// Edit a post. Any edit of a reviewed post sends it back to `created`.
    ///
    /// Fields left as `None` keep their stored value.
    pub async fn update_post(
        &self,
        id: PostId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Post, LifecycleError> {
        let current = self.get_post(id).await?;
        let edit = NewPost::new(
            title.unwrap_or(&current.title),
            content.unwrap_or(&current.content),
        )?;

        let mut post = self.repository.update_content(id, edit).await?;
        self.manager.reset_after_edit(&mut post).await?;
        Ok(post)
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, LifecycleError> {
        self.repository
            .find(id)
            .await?
            .ok_or(LifecycleError::NotFound { id })
    }

    pub async fn verify_with_ai(&self, id: PostId) -> Result<AiVerification, LifecycleError> {
        let mut post = self.get_post(id).await?;
        self.manager.verify_with_ai(&mut post).await
    }

    pub async fn verify(&self, id: PostId) -> Result<LifecycleState, LifecycleError> {
        let mut post = self.get_post(id).await?;
        self.manager.verify(&mut post).await
    }

    pub async fn publish(&self, id: PostId) -> Result<LifecycleState, LifecycleError> {
        let mut post = self.get_post(id).await?;
        self.manager.publish(&mut post).await
    }

    pub async fn delete(&self, id: PostId) -> Result<LifecycleState, LifecycleError> {
        let mut post = self.get_post(id).await?;
        self.manager.delete(&mut post).await
    }

    pub async fn restore(&self, id: PostId) -> Result<LifecycleState, LifecycleError> {
        let mut post = self.get_post(id).await?;
        self.manager.restore(&mut post).await
    }

    pub async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, LifecycleError> {
        Ok(self.repository.list(filter).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Post>, LifecycleError> {
        self.list(PostFilter::Active).await
    }

    pub async fn list_published(&self) -> Result<Vec<Post>, LifecycleError> {
        self.list(PostFilter::Published).await
    }

    pub async fn list_pending_review(&self) -> Result<Vec<Post>, LifecycleError> {
        self.list(PostFilter::PendingReview).await
    }
}
