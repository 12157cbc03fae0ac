use serde::{Deserialize, Serialize};

/// Reason used when a structured response omits one
pub const DEFAULT_REASON: &str = "no reason given";
/// Reason used when plain-text approval is detected
pub const DEFAULT_APPROVAL_REASON: &str = "content meets the moderation standards";
/// Reason used for every fail-closed rejection without a stated reason
pub const DEFAULT_REJECTION_REASON: &str = "content does not meet the moderation standards";

pub const APPROVED_PREFIX: &str = "approved";
pub const REJECTED_PREFIX: &str = "rejected";
pub const FAILURE_PREFIX: &str = "verification failed";

/// Approve/reject decision derived from one moderation response
///
/// Only built through `Verdict::new`, so the reason is never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub approved: bool,
    reason: String,
}

impl Verdict {
    /// An empty or whitespace-only reason is replaced with `DEFAULT_REASON`
    pub fn new(approved: bool, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            reason
        };
        Self { approved, reason }
    }

    pub fn approve(reason: impl Into<String>) -> Self {
        Self::new(true, reason)
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self::new(false, reason)
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Caller-facing result of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub message: String,
}

impl VerificationOutcome {
    pub fn from_verdict(verdict: &Verdict) -> Self {
        let prefix = if verdict.approved {
            APPROVED_PREFIX
        } else {
            REJECTED_PREFIX
        };
        Self {
            success: verdict.approved,
            message: format!("{prefix}: {}", verdict.reason()),
        }
    }

    /// Technical failures never count as approval
    pub fn failure(cause: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            message: format!("{FAILURE_PREFIX}: {cause}"),
        }
    }
}
