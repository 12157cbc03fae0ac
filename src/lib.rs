// Postgate Library - moderation-gated publishing workflow
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod moderation;
pub mod service;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use crate::config::{config, init_config, PostgateConfig, StorageBackend};
pub use crate::lifecycle::{
    available_events, can_fire, fire, AiVerification, LifecycleError, LifecycleEvent, LifecycleManager,
    LifecycleState, TransitionError,
};
pub use crate::moderation::{
    interpret_response, ModerationOrchestrator, ModerationRequest, ModerationTransport,
    OpenAiTransport, TransportError, Verdict, VerificationOutcome,
};
pub use crate::service::PostService;
pub use crate::store::{
    FilePostRepository, InMemoryPostRepository, NewPost, Post, PostFilter, PostId,
    PostRepository, StoreError,
};
pub use crate::telemetry::{create_moderation_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
