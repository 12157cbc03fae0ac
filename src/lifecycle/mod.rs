//! Post lifecycle: states, the transition table and the item-level manager.

pub mod manager;
pub mod state_machine;
pub mod types;

pub use manager::{AiVerification, LifecycleError, LifecycleManager};
pub use state_machine::{available_events, can_fire, fire, TransitionError};
pub use types::{LifecycleEvent, LifecycleState, UnknownState};
