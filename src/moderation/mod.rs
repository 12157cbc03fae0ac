// Automated moderation: the outbound call, its failure boundary, and the
// interpretation of whatever text comes back.

pub mod interpreter;
pub mod openai;
pub mod orchestrator;
pub mod transport;
pub mod verdict;

pub use interpreter::interpret_response;
pub use openai::OpenAiTransport;
pub use orchestrator::ModerationOrchestrator;
pub use transport::{ModerationRequest, ModerationTransport, TransportError};
pub use verdict::{Verdict, VerificationOutcome};
