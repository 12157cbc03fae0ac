//! End-to-end workflow scenarios against the in-memory store
//!
//! The moderation service is replaced by a scripted transport that replays
//! canned replies in order and counts how often it was called.

use async_trait::async_trait;
use postgate::{
    InMemoryPostRepository, LifecycleError, LifecycleState, ModerationOrchestrator,
    ModerationRequest, ModerationTransport, PostRepository, PostService, TransportError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = Result<String, TransportError>;

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModerationTransport for ScriptedTransport {
    async fn complete(&self, _request: &ModerationRequest) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}

fn approve() -> Reply {
    Ok(r#"{"approved": true, "reason": "Safe"}"#.to_string())
}

/// Never answers its first request; approves every later one
#[derive(Default)]
struct StallOnceTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl ModerationTransport for StallOnceTransport {
    async fn complete(&self, _request: &ModerationRequest) -> Result<String, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        approve()
    }
}

fn service_with(transport: Arc<dyn ModerationTransport>) -> PostService<InMemoryPostRepository> {
    let orchestrator = ModerationOrchestrator::new(transport, Duration::from_secs(5));
    PostService::new(InMemoryPostRepository::new(), Arc::new(orchestrator))
}

#[tokio::test]
async fn test_full_happy_path() {
    let transport = ScriptedTransport::new([approve()]);
    let service = service_with(transport.clone());
    let post = service.create_post("Hello", "World").await.unwrap();

    let verification = service.verify_with_ai(post.id).await.unwrap();
    assert_eq!(verification.state, LifecycleState::AiVerified);
    assert_eq!(verification.message, "approved: Safe");
    assert_eq!(service.verify(post.id).await.unwrap(), LifecycleState::Verified);
    assert_eq!(service.publish(post.id).await.unwrap(), LifecycleState::Published);

    assert_eq!(transport.calls(), 1);
    let stored = service.get_post(post.id).await.unwrap();
    assert!(stored.is_published());
    assert!(stored.is_active());
    assert!(!stored.is_pending_review());
}

#[tokio::test]
async fn test_no_skipping_ahead() {
    let service = service_with(ScriptedTransport::new([]));
    let post = service.create_post("Hello", "World").await.unwrap();

    for result in [
        service.verify(post.id).await,
        service.publish(post.id).await,
        service.restore(post.id).await,
    ] {
        assert!(matches!(result, Err(LifecycleError::InvalidTransition(_))));
    }
    assert_eq!(
        service.get_post(post.id).await.unwrap().state,
        LifecycleState::Created
    );
}

#[tokio::test]
async fn test_verified_post_walkthrough() {
    let service = service_with(ScriptedTransport::new([approve()]));
    let post = service.create_post("Hello", "World").await.unwrap();
    service.verify_with_ai(post.id).await.unwrap();
    service.verify(post.id).await.unwrap();

    let err = service.verify(post.id).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot verify a post in state verified");

    assert_eq!(service.publish(post.id).await.unwrap(), LifecycleState::Published);
    assert_eq!(service.delete(post.id).await.unwrap(), LifecycleState::Deleted);
    assert_eq!(service.restore(post.id).await.unwrap(), LifecycleState::Created);
}

#[tokio::test]
async fn test_deleting_twice_is_invalid() {
    let service = service_with(ScriptedTransport::new([]));
    let post = service.create_post("Hello", "World").await.unwrap();

    service.delete(post.id).await.unwrap();
    let err = service.delete(post.id).await.unwrap_err();

    assert!(matches!(err, LifecycleError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_rejection_and_failures_leave_state_untouched() {
    let transport = ScriptedTransport::new([
        Ok(r#"{"approved": false, "reason": "Нецензурная лексика"}"#.to_string()),
        Ok("The content is not approved.".to_string()),
        Ok(String::new()),
        Err(TransportError::Status {
            status: 503,
            body: "overloaded".to_string(),
        }),
        approve(),
    ]);
    let service = service_with(transport.clone());
    let post = service.create_post("Hello", "World").await.unwrap();

    let expected = [
        "rejected: Нецензурная лексика",
        "rejected: content does not meet the moderation standards",
        "rejected: content does not meet the moderation standards",
        "verification failed: moderation service returned HTTP 503: overloaded",
    ];
    for message in expected {
        let err = service.verify_with_ai(post.id).await.unwrap_err();
        assert!(
            matches!(&err, LifecycleError::Rejected { message: m } if m == message),
            "unexpected error: {err}"
        );
        assert_eq!(
            service.get_post(post.id).await.unwrap().state,
            LifecycleState::Created
        );
    }

    assert_eq!(
        service.verify_with_ai(post.id).await.unwrap().state,
        LifecycleState::AiVerified
    );
    assert_eq!(transport.calls(), 5);
}

#[tokio::test]
async fn test_edits_force_re_review() {
    let transport = ScriptedTransport::new([approve(), approve()]);
    let service = service_with(transport.clone());
    let post = service.create_post("Hello", "World").await.unwrap();
    service.verify_with_ai(post.id).await.unwrap();
    service.verify(post.id).await.unwrap();

    let edited = service
        .update_post(post.id, Some("Hello again"), None)
        .await
        .unwrap();
    assert_eq!(edited.state, LifecycleState::Created);
    assert!(matches!(
        service.publish(post.id).await,
        Err(LifecycleError::InvalidTransition(_))
    ));

    service.verify_with_ai(post.id).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_edit_does_not_resurrect_deleted_post() {
    let service = service_with(ScriptedTransport::new([]));
    let post = service.create_post("Hello", "World").await.unwrap();
    service.delete(post.id).await.unwrap();

    let edited = service
        .update_post(post.id, None, Some("changed"))
        .await
        .unwrap();

    assert_eq!(edited.state, LifecycleState::Deleted);
    assert!(!edited.is_active());
}

#[tokio::test]
async fn test_concurrent_writers_get_conflict() {
    let service = service_with(ScriptedTransport::new([]));
    let post = service.create_post("Hello", "World").await.unwrap();

    // Two callers loaded the same snapshot
    let mut first = service.get_post(post.id).await.unwrap();
    let mut second = first.clone();

    service.manager().delete(&mut first).await.unwrap();
    let err = service.manager().delete(&mut second).await.unwrap_err();

    assert!(matches!(err, LifecycleError::Conflict { .. }));
    assert_eq!(second.state, LifecycleState::Created);
    assert_eq!(
        service.manager().repository().find(post.id).await.unwrap().unwrap().state,
        LifecycleState::Deleted
    );
}

#[tokio::test]
async fn test_moderation_sees_current_title_and_content() {
    struct EchoTransport;

    #[async_trait]
    impl ModerationTransport for EchoTransport {
        async fn complete(&self, request: &ModerationRequest) -> Result<String, TransportError> {
            let approved = request.user_prompt.contains("Содержание: clean");
            Ok(format!(r#"{{"approved": {approved}, "reason": "checked"}}"#))
        }
    }

    let orchestrator = ModerationOrchestrator::new(Arc::new(EchoTransport), Duration::from_secs(5));
    let service = PostService::new(InMemoryPostRepository::new(), Arc::new(orchestrator));
    let post = service.create_post("Title", "dirty").await.unwrap();

    assert!(service.verify_with_ai(post.id).await.is_err());
    service.update_post(post.id, None, Some("clean")).await.unwrap();
    let verification = service.verify_with_ai(post.id).await.unwrap();
    assert_eq!(verification.state, LifecycleState::AiVerified);
    assert_eq!(verification.message, "approved: checked");
}

#[tokio::test]
async fn test_abandoned_verification_leaves_post_untouched() {
    let transport = Arc::new(StallOnceTransport::default());
    let service = service_with(transport.clone());
    let post = service.create_post("Hello", "World").await.unwrap();

    // The caller gives up long before the moderation timeout.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), service.verify_with_ai(post.id)).await;
    assert!(abandoned.is_err());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        service.get_post(post.id).await.unwrap().state,
        LifecycleState::Created
    );

    let verification = service.verify_with_ai(post.id).await.unwrap();
    assert_eq!(verification.state, LifecycleState::AiVerified);
}

#[tokio::test]
async fn test_aborted_verification_task_leaves_post_untouched() {
    let transport = Arc::new(StallOnceTransport::default());
    let service = Arc::new(service_with(transport.clone()));
    let post = service.create_post("Hello", "World").await.unwrap();

    let task = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.verify_with_ai(post.id).await })
    };
    while transport.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(
        service.get_post(post.id).await.unwrap().state,
        LifecycleState::Created
    );
    assert_eq!(
        service.verify_with_ai(post.id).await.unwrap().state,
        LifecycleState::AiVerified
    );
}
