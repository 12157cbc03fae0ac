// Core types for the post lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle states of a post.
///
/// The serialized tokens are the values persisted in the `state` column and
/// must stay stable for compatibility with stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Freshly created or edited; awaiting automated moderation
    Created,
    /// Passed automated moderation; awaiting human verification
    AiVerified,
    /// Verified by a human; ready to publish
    Verified,
    /// Publicly visible
    Published,
    /// Logically deleted; only `restore` leaves this state
    Deleted,
}

/// Events that request a lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    VerifyWithAi,
    Verify,
    Publish,
    Delete,
    Restore,
    ResetToCreated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lifecycle state token: {0:?}")]
pub struct UnknownState(pub String);

impl LifecycleState {
    pub const ALL: [LifecycleState; 5] = [
        LifecycleState::Created,
        LifecycleState::AiVerified,
        LifecycleState::Verified,
        LifecycleState::Published,
        LifecycleState::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::AiVerified => "ai_verified",
            LifecycleState::Verified => "verified",
            LifecycleState::Published => "published",
            LifecycleState::Deleted => "deleted",
        }
    }

    /// Anything not logically deleted
    pub fn is_active(&self) -> bool {
        !matches!(self, LifecycleState::Deleted)
    }

    pub fn is_published(&self) -> bool {
        matches!(self, LifecycleState::Published)
    }

    /// Still waiting on either automated or human review
    pub fn is_pending_review(&self) -> bool {
        matches!(self, LifecycleState::Created | LifecycleState::AiVerified)
    }

    /// States whose moderation results an edit invalidates
    pub fn is_reviewed(&self) -> bool {
        matches!(
            self,
            LifecycleState::AiVerified | LifecycleState::Verified | LifecycleState::Published
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 6] = [
        LifecycleEvent::VerifyWithAi,
        LifecycleEvent::Verify,
        LifecycleEvent::Publish,
        LifecycleEvent::Delete,
        LifecycleEvent::Restore,
        LifecycleEvent::ResetToCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::VerifyWithAi => "verify_with_ai",
            LifecycleEvent::Verify => "verify",
            LifecycleEvent::Publish => "publish",
            LifecycleEvent::Delete => "delete",
            LifecycleEvent::Restore => "restore",
            LifecycleEvent::ResetToCreated => "reset_to_created",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
