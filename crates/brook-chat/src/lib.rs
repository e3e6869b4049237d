//! brook-chat: the conversation data model and streaming text plumbing
//!
//! This crate holds everything about a chat transcript that does not need an
//! async runtime: messages and their parts, delta reconciliation, raw stream
//! event classification, and the mapping to model-bound history. Everything
//! here is synchronous and total; the async orchestration lives in
//! brook-conversation.

pub mod classify;
pub mod outbound;
pub mod reconcile;
pub mod transcript;
pub mod types;

pub use classify::{classify, Classified, RawDelta, RawStreamEvent};
pub use outbound::{build_history, OutboundContent, OutboundMessage, OutboundRole};
pub use reconcile::{merge, OVERLAP_WINDOW};
pub use transcript::Transcript;
pub use types::*;
