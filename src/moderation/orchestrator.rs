use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, Instrument};

use super::interpreter::interpret_response;
use super::transport::{ModerationRequest, ModerationTransport, TransportError};
use super::verdict::VerificationOutcome;
use crate::telemetry::{create_moderation_span, generate_correlation_id};

/// Runs one moderation call per `verify` and folds every failure mode into a
/// `VerificationOutcome`.
pub struct ModerationOrchestrator {
    transport: Arc<dyn ModerationTransport>,
    timeout: Duration,
}

impl std::fmt::Debug for ModerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationOrchestrator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ModerationOrchestrator {
    pub fn new(transport: Arc<dyn ModerationTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the moderation service about a post.
    ///
    /// Never fails: transport errors and timeouts come back as an unsuccessful
    /// outcome whose message carries the cause. Dropping the returned future
    /// abandons the call without side effects.
    pub async fn verify(&self, title: &str, content: &str) -> VerificationOutcome {
        let correlation_id = generate_correlation_id();
        let span = create_moderation_span("verify", &correlation_id);

        async {
            let request = ModerationRequest::for_post(title, content);
            let started = Instant::now();

            let result = match tokio::time::timeout(self.timeout, self.transport.complete(&request)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    after_ms: self.timeout.as_millis() as u64,
                }),
            };
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(text) => {
                    let verdict = interpret_response(&text);
                    info!(
                        approved = verdict.approved,
                        reason = %verdict.reason(),
                        duration_ms,
                        "Moderation verdict received"
                    );
                    VerificationOutcome::from_verdict(&verdict)
                }
                Err(e) => {
                    error!(error = %e, duration_ms, "Moderation call failed");
                    VerificationOutcome::failure(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
