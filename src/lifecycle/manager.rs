use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::state_machine::{can_fire, fire, TransitionError};
use super::types::{LifecycleEvent, LifecycleState};
use crate::moderation::ModerationOrchestrator;
use crate::store::{Post, PostId, PostRepository, StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("post {id} was changed by someone else (now {actual}); reload and retry")]
    Conflict { id: PostId, actual: LifecycleState },

    #[error("{message}")]
    Rejected { message: String },

    #[error("post {id} not found")]
    NotFound { id: PostId },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, actual, .. } => LifecycleError::Conflict { id, actual },
            StoreError::NotFound { id } => LifecycleError::NotFound { id },
            other => LifecycleError::Storage(other),
        }
    }
}

/// Result of a successful automated moderation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiVerification {
    pub state: LifecycleState,
    /// Outcome message from the moderation service, e.g. `approved: Safe`
    pub message: String,
}

/// Item-level workflow operations.
///
/// Every state change goes through `fire` and is persisted with a
/// compare-and-set against the state the caller loaded. `post.state` is only
/// updated after the store accepted the write, so a failed operation leaves
/// the caller's copy as it was.
pub struct LifecycleManager<R: PostRepository> {
    repository: Arc<R>,
    orchestrator: Arc<ModerationOrchestrator>,
}

impl<R: PostRepository> LifecycleManager<R> {
    pub fn new(repository: Arc<R>, orchestrator: Arc<ModerationOrchestrator>) -> Self {
        Self {
            repository,
            orchestrator,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Send a freshly edited post back to `created`.
    ///
    /// `created` and `deleted` posts are left alone: an edit never advances a
    /// post and never brings a deleted one back.
    pub async fn reset_after_edit(&self, post: &mut Post) -> Result<LifecycleState, LifecycleError> {
        match post.state {
            LifecycleState::Created | LifecycleState::Deleted => Ok(post.state),
            _ => self.apply(post, LifecycleEvent::ResetToCreated).await,
        }
    }

    /// Run automated moderation and move to `ai_verified` on approval.
    ///
    /// A rejection or a failed call surfaces as `LifecycleError::Rejected`
    /// carrying the outcome message; the post keeps its state. On approval the
    /// message is handed back alongside the new state.
    pub async fn verify_with_ai(&self, post: &mut Post) -> Result<AiVerification, LifecycleError> {
        // No point paying for a moderation call the table would refuse anyway.
        if !can_fire(post.state, LifecycleEvent::VerifyWithAi) {
            return Err(TransitionError::InvalidTransition {
                from: post.state,
                event: LifecycleEvent::VerifyWithAi,
            }
            .into());
        }

        let outcome = self.orchestrator.verify(&post.title, &post.content).await;
        if !outcome.success {
            warn!(post_id = post.id, message = %outcome.message, "Automated moderation did not approve post");
            return Err(LifecycleError::Rejected {
                message: outcome.message,
            });
        }

        let state = self.apply(post, LifecycleEvent::VerifyWithAi).await?;
        Ok(AiVerification {
            state,
            message: outcome.message,
        })
    }

    pub async fn verify(&self, post: &mut Post) -> Result<LifecycleState, LifecycleError> {
        self.apply(post, LifecycleEvent::Verify).await
    }

    pub async fn publish(&self, post: &mut Post) -> Result<LifecycleState, LifecycleError> {
        self.apply(post, LifecycleEvent::Publish).await
    }

    pub async fn delete(&self, post: &mut Post) -> Result<LifecycleState, LifecycleError> {
        self.apply(post, LifecycleEvent::Delete).await
    }

    pub async fn restore(&self, post: &mut Post) -> Result<LifecycleState, LifecycleError> {
        self.apply(post, LifecycleEvent::Restore).await
    }

    pub fn is_active(post: &Post) -> bool {
        post.state.is_active()
    }

    pub fn is_published(post: &Post) -> bool {
        post.state.is_published()
    }

    pub fn is_pending_review(post: &Post) -> bool {
        post.state.is_pending_review()
    }

    async fn apply(
        &self,
        post: &mut Post,
        event: LifecycleEvent,
    ) -> Result<LifecycleState, LifecycleError> {
        let from = post.state;
        let to = fire(from, event)?;

        let stored = self.repository.transition(post.id, from, to).await?;
        post.state = stored.state;
        post.updated_at = stored.updated_at;

        info!(
            post_id = post.id,
            from = %from,
            to = %to,
            event = %event,
            "Post transitioned"
        );
        Ok(to)
    }
}
