use thiserror::Error;

use super::types::{LifecycleEvent, LifecycleState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} a post in state {from}")]
    InvalidTransition {
        from: LifecycleState,
        event: LifecycleEvent,
    },
}

/// Apply `event` to `current` and return the resulting state.
///
/// This match is the whole transition table. Nothing else in the crate decides
/// whether a move is legal; callers that need to know ask `can_fire` or
/// `available_events`, both of which defer to this function.
pub fn fire(
    current: LifecycleState,
    event: LifecycleEvent,
) -> Result<LifecycleState, TransitionError> {
    use LifecycleEvent as E;
    use LifecycleState as S;

    let next = match (event, current) {
        (E::VerifyWithAi, S::Created) => S::AiVerified,
        (E::Verify, S::AiVerified) => S::Verified,
        (E::Publish, S::Verified) => S::Published,
        (E::Delete, S::Created | S::AiVerified | S::Verified | S::Published) => S::Deleted,
        (E::Restore, S::Deleted) => S::Created,
        (E::ResetToCreated, S::AiVerified | S::Verified | S::Published) => S::Created,
        _ => {
            return Err(TransitionError::InvalidTransition {
                from: current,
                event,
            })
        }
    };

    Ok(next)
}

pub fn can_fire(current: LifecycleState, event: LifecycleEvent) -> bool {
    fire(current, event).is_ok()
}

/// Events that are legal from `current`, in declaration order
pub fn available_events(current: LifecycleState) -> Vec<LifecycleEvent> {
    LifecycleEvent::ALL
        .into_iter()
        .filter(|event| can_fire(current, *event))
        .collect()
}
