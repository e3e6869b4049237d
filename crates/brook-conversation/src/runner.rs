//! The seam between a conversation and the model backend producing its output.
//!
//! A runner receives the outbound history plus a tracker for reporting tool
//! invocations, and answers with one of two stream shapes: plain text
//! fragments, or raw structured events that the conversation classifies
//! itself. Any OpenAI-compatible gateway, local model, or test script plugs
//! in here; the conversation knows nothing beyond this contract.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use brook_chat::{OutboundMessage, RawStreamEvent};

use crate::error::{Result, RunnerError};
use crate::tool::{ToolSet, ToolTracker};

/// A stream of plain text fragments
pub type FragmentStream =
    Pin<Box<dyn Stream<Item = std::result::Result<String, RunnerError>> + Send>>;

/// A stream of raw provider events
pub type EventStream =
    Pin<Box<dyn Stream<Item = std::result::Result<RawStreamEvent, RunnerError>> + Send>>;

/// The two stream shapes a runner may answer with
pub enum RunnerStream {
    /// Every fragment is answer text
    Text(FragmentStream),
    /// Events carry their own tags and pass through classification
    Events(EventStream),
}

/// Per-turn limits handed to the runner
#[derive(Debug, Clone, Copy)]
pub struct RunnerSettings {
    /// Upper bound on model/tool round trips within one turn
    pub max_steps: u32,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self { max_steps: 5 }
    }
}

/// Everything a runner needs for one turn
pub struct RunnerRequest {
    /// Prior history including the just-sent user message, system prompt first
    pub history: Vec<OutboundMessage>,
    /// Tools the backend may call, with their schemas
    pub tools: Arc<ToolSet>,
    /// Reports tool invocations into the active assistant message
    pub tracker: ToolTracker,
    /// Cancelled when the caller aborts the turn
    pub cancel: CancellationToken,
    pub settings: RunnerSettings,
}

/// Produces the model output stream for one conversation turn
#[async_trait]
pub trait StreamRunner: Send + Sync {
    async fn run(&self, request: RunnerRequest) -> Result<RunnerStream>;
}
