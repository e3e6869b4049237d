//! brook-conversation: the streaming conversation engine.
//!
//! A [`Conversation`] owns an ordered transcript and drives it one turn at a
//! time: `send` appends the user message, streams the model's reply into an
//! assistant placeholder fragment by fragment, and settles with a
//! [`TurnOutcome`]. Transport is abstracted behind [`StreamRunner`], tools
//! behind [`Tool`], and storage behind [`ConversationStore`]; UI layers follow
//! along through the broadcast [`ConversationEvent`] feed.

pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod persist;
pub mod runner;
pub mod tool;

pub use conversation::{Conversation, ConversationConfig, TurnOutcome, DEFAULT_FAILURE_NOTICE};
pub use error::{Result, RunnerError};
pub use events::ConversationEvent;
pub use handle::ConversationHandle;
pub use persist::{
    ConversationStore, DebouncedPersister, JsonlStore, MemoryStore, DEFAULT_PERSIST_DELAY,
};
pub use runner::{
    EventStream, FragmentStream, RunnerRequest, RunnerSettings, RunnerStream, StreamRunner,
};
pub use tool::{BoxedTool, Tool, ToolDescriptor, ToolResult, ToolSet, ToolTracker};
