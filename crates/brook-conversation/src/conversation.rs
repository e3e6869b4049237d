//! Conversation state management and turn execution

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use brook_chat::{
    build_history, classify, fresh_id, Classified, FragmentKind, Message, Part, ToolStatus,
    Transcript, UserInput,
};

use crate::error::RunnerError;
use crate::events::ConversationEvent;
use crate::handle::ConversationHandle;
use crate::persist::{ConversationStore, DebouncedPersister, DEFAULT_PERSIST_DELAY};
use crate::runner::{
    EventStream, FragmentStream, RunnerRequest, RunnerSettings, RunnerStream, StreamRunner,
};
use crate::tool::{BoxedTool, ToolSet, ToolTracker};

/// Shown in place of the assistant's answer when a turn fails
pub const DEFAULT_FAILURE_NOTICE: &str =
    "Sorry, something went wrong while handling your request.";

/// Conversation configuration
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// System prompt prepended to every outbound history
    pub system_prompt: Option<String>,
    /// Stable id for persistence; generated when not set
    pub conversation_id: Option<String>,
    /// User-facing text written into the transcript when a turn fails
    pub failure_notice: String,
    /// Per-turn limits handed to the stream runner
    pub runner: RunnerSettings,
    /// Debounce delay for the persistence gateway
    pub persist_delay: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            conversation_id: None,
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
            runner: RunnerSettings::default(),
            persist_delay: DEFAULT_PERSIST_DELAY,
        }
    }
}

/// How a send settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The stream was consumed to its end
    Completed,
    /// The runner failed; the failure notice was written into the transcript
    Failed,
    /// The caller aborted; partial content was kept as-is
    Cancelled,
    /// Blank input, or another turn was still in flight; nothing happened
    Ignored,
}

/// State shared between the conversation, its tool tracker, and subscribers.
///
/// Every transcript mutation goes through a method that locks, applies,
/// snapshots for the event, and nudges the persister, so readers only ever
/// observe whole updates. `active_assistant` marks the one message open for
/// tool recordings; outside a turn it is `None` and tracker calls stop
/// recording, which freezes settled messages against late tool completions.
pub(crate) struct Shared {
    pub(crate) conversation_id: String,
    pub(crate) transcript: Mutex<Transcript>,
    pub(crate) event_tx: broadcast::Sender<ConversationEvent>,
    pub(crate) persister: Option<DebouncedPersister>,
    pub(crate) active_assistant: Mutex<Option<String>>,
}

impl Shared {
    pub(crate) fn new(conversation_id: String, persister: Option<DebouncedPersister>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            conversation_id,
            transcript: Mutex::new(Transcript::new()),
            event_tx,
            persister,
            active_assistant: Mutex::new(None),
        }
    }

    /// Route a streamed fragment into the active assistant message
    pub(crate) fn apply_fragment(&self, message_id: &str, kind: FragmentKind, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        let updated = {
            let mut transcript = self.transcript.lock();
            transcript.append_or_extend(message_id, kind, fragment);
            transcript.get(message_id).cloned()
        };
        if let Some(message) = updated {
            let _ = self.event_tx.send(ConversationEvent::MessageUpdate { message });
            self.nudge();
        }
    }

    /// Record a pending tool invocation at the current end of the message.
    ///
    /// Only the turn's active assistant message accepts recordings. A tracker
    /// retained past settle still gets an id back, but nothing is written.
    pub(crate) fn begin_tool(
        &self,
        message_id: &str,
        tool_name: &str,
        arguments: Option<serde_json::Value>,
    ) -> String {
        let active = self.active_assistant.lock();
        if active.as_deref() != Some(message_id) {
            return fresh_id();
        }
        let (part_id, updated) = {
            let mut transcript = self.transcript.lock();
            let part_id = transcript.add_tool_part(message_id, tool_name, arguments.clone());
            (part_id, transcript.get(message_id).cloned())
        };
        if let Some(message) = updated {
            let _ = self.event_tx.send(ConversationEvent::ToolStart {
                part_id: part_id.clone(),
                tool_name: tool_name.to_string(),
                arguments: arguments.unwrap_or(serde_json::Value::Null),
            });
            let _ = self.event_tx.send(ConversationEvent::MessageUpdate { message });
            self.nudge();
        }
        part_id
    }

    /// Settle a tool part; late and repeated settles are dropped silently
    pub(crate) fn finish_tool(&self, message_id: &str, part_id: &str, status: ToolStatus) {
        let active = self.active_assistant.lock();
        if active.as_deref() != Some(message_id) {
            return;
        }
        let (changed, tool_name, updated) = {
            let mut transcript = self.transcript.lock();
            let changed = transcript.finish_tool_part(message_id, part_id, status);
            let tool_name = transcript
                .get(message_id)
                .and_then(|m| m.parts())
                .and_then(|parts| {
                    parts.iter().find_map(|part| match part {
                        Part::Tool { id, tool_name, .. } if id == part_id => {
                            Some(tool_name.clone())
                        }
                        _ => None,
                    })
                });
            (changed, tool_name, transcript.get(message_id).cloned())
        };
        if !changed {
            return;
        }
        let _ = self.event_tx.send(ConversationEvent::ToolEnd {
            part_id: part_id.to_string(),
            tool_name: tool_name.unwrap_or_default(),
            status,
        });
        if let Some(message) = updated {
            let _ = self.event_tx.send(ConversationEvent::MessageUpdate { message });
        }
        self.nudge();
    }

    /// Replace the trailing text of the message with the failure notice
    pub(crate) fn apply_failure(&self, message_id: &str, notice: &str) {
        let updated = {
            let mut transcript = self.transcript.lock();
            transcript.overwrite_trailing_text(message_id, notice);
            transcript.get(message_id).cloned()
        };
        if let Some(message) = updated {
            let _ = self.event_tx.send(ConversationEvent::MessageUpdate { message });
            self.nudge();
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Message> {
        self.transcript.lock().snapshot()
    }

    fn nudge(&self) {
        if let Some(persister) = &self.persister {
            persister.nudge(self.snapshot());
        }
    }
}

/// A single chat conversation and the state machine driving each send.
///
/// One send runs at a time; a second send while one is in flight is a no-op.
/// All mutation of the message list happens on the task that owns the active
/// `send` call, between stream suspension points.
pub struct Conversation {
    config: ConversationConfig,
    runner: Arc<dyn StreamRunner>,
    tools: Arc<ToolSet>,
    shared: Arc<Shared>,
    handle: ConversationHandle,
}

impl Conversation {
    /// Create a conversation without persistence
    pub fn new(config: ConversationConfig, runner: Arc<dyn StreamRunner>) -> Self {
        Self::build(config, runner, None)
    }

    /// Create a conversation mirrored into the given store
    pub fn with_store(
        config: ConversationConfig,
        runner: Arc<dyn StreamRunner>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self::build(config, runner, Some(store))
    }

    fn build(
        config: ConversationConfig,
        runner: Arc<dyn StreamRunner>,
        store: Option<Arc<dyn ConversationStore>>,
    ) -> Self {
        let conversation_id = config.conversation_id.clone().unwrap_or_else(fresh_id);
        let persister = store.map(|store| {
            DebouncedPersister::new(conversation_id.clone(), store, config.persist_delay)
        });
        Self {
            config,
            runner,
            tools: Arc::new(ToolSet::new()),
            shared: Arc::new(Shared::new(conversation_id, persister)),
            handle: ConversationHandle::new(),
        }
    }

    /// Subscribe to conversation events
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Get the conversation config
    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Stable id used for persistence
    pub fn conversation_id(&self) -> &str {
        &self.shared.conversation_id
    }

    /// Add a tool
    pub fn add_tool(&mut self, tool: BoxedTool) {
        Arc::make_mut(&mut self.tools).add(tool);
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names().iter().map(|n| n.to_string()).collect()
    }

    /// A snapshot of all messages in order
    pub fn messages(&self) -> Vec<Message> {
        self.shared.snapshot()
    }

    /// Replace the transcript with restored history
    pub fn seed(&self, messages: Vec<Message>) {
        self.shared.transcript.lock().seed(messages);
    }

    /// Get a cloneable handle for aborting from external code
    pub fn handle(&self) -> ConversationHandle {
        self.handle.clone()
    }

    /// Abort the in-flight turn
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether a turn is currently in flight
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Write the current transcript to the store now, skipping the debounce
    pub async fn flush(&self) {
        if let Some(persister) = &self.shared.persister {
            persister.flush(self.shared.snapshot()).await;
        }
    }

    /// Run one conversation turn: append the user message and an assistant
    /// placeholder, stream the model output into the placeholder, and settle.
    ///
    /// Blank input and sends issued while a turn is in flight are no-ops.
    /// Failures never propagate out; they are written into the transcript as
    /// the configured failure notice and reported through the outcome.
    pub async fn send(&self, input: impl Into<UserInput>) -> TurnOutcome {
        let input = input.into();
        if input.is_blank() {
            tracing::debug!("send ignored: blank input");
            return TurnOutcome::Ignored;
        }
        if !self.handle.try_begin_turn() {
            tracing::debug!("send ignored: a turn is already in flight");
            return TurnOutcome::Ignored;
        }

        let outcome = self.run_turn(input).await;

        // Freeze the assistant message before anyone hears the turn is over;
        // a tracker retained by the runner goes inert from here on.
        *self.shared.active_assistant.lock() = None;
        let _ = self.shared.event_tx.send(ConversationEvent::TurnEnd { outcome });
        self.handle.end_turn();
        outcome
    }

    async fn run_turn(&self, input: UserInput) -> TurnOutcome {
        let cancel = self.handle.current_token();
        let user_message = input.into_message();

        // The user message and the placeholder appear together; the history
        // sent out ends at the user message.
        let (assistant_id, history) = {
            let mut transcript = self.shared.transcript.lock();
            transcript.push(user_message.clone());
            let history =
                build_history(transcript.messages(), self.config.system_prompt.as_deref());
            let assistant_id = transcript.push_assistant_placeholder();
            (assistant_id, history)
        };
        *self.shared.active_assistant.lock() = Some(assistant_id.clone());
        let _ = self.shared.event_tx.send(ConversationEvent::TurnStart {
            user_message,
            assistant_id: assistant_id.clone(),
        });
        self.shared.nudge();

        let request = RunnerRequest {
            history,
            tools: Arc::clone(&self.tools),
            tracker: ToolTracker::new(Arc::clone(&self.shared), assistant_id.clone()),
            cancel: cancel.clone(),
            settings: self.config.runner,
        };

        let stream = match self.runner.run(request).await {
            Ok(stream) => stream,
            Err(e) => {
                if cancel.is_cancelled() {
                    return TurnOutcome::Cancelled;
                }
                return self.fail_turn(&assistant_id, &e);
            }
        };

        match stream {
            RunnerStream::Text(fragments) => {
                self.consume_text(fragments, &assistant_id, &cancel).await
            }
            RunnerStream::Events(events) => {
                self.consume_events(events, &assistant_id, &cancel).await
            }
        }
    }

    /// Flat-text path: every fragment is answer text
    async fn consume_text(
        &self,
        mut fragments: FragmentStream,
        assistant_id: &str,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return TurnOutcome::Cancelled,
                item = fragments.next() => match item {
                    None => return TurnOutcome::Completed,
                    Some(Ok(fragment)) => {
                        self.shared.apply_fragment(assistant_id, FragmentKind::Text, &fragment);
                    }
                    Some(Err(e)) => {
                        if cancel.is_cancelled() {
                            return TurnOutcome::Cancelled;
                        }
                        return self.fail_turn(assistant_id, &e);
                    }
                },
            }
        }
    }

    /// Structured path: classify each raw event, route or drop it
    async fn consume_events(
        &self,
        mut events: EventStream,
        assistant_id: &str,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return TurnOutcome::Cancelled,
                item = events.next() => match item {
                    None => return TurnOutcome::Completed,
                    Some(Ok(event)) => match classify(&event) {
                        Classified::Text(fragment) => {
                            self.shared.apply_fragment(assistant_id, FragmentKind::Text, fragment);
                        }
                        Classified::Reasoning(fragment) => {
                            self.shared
                                .apply_fragment(assistant_id, FragmentKind::Reasoning, fragment);
                        }
                        Classified::Ignored => {}
                    },
                    Some(Err(e)) => {
                        if cancel.is_cancelled() {
                            return TurnOutcome::Cancelled;
                        }
                        return self.fail_turn(assistant_id, &e);
                    }
                },
            }
        }
    }

    fn fail_turn(&self, assistant_id: &str, error: &RunnerError) -> TurnOutcome {
        tracing::error!("Turn failed: {}", error);
        self.shared
            .apply_failure(assistant_id, &self.config.failure_notice);
        TurnOutcome::Failed
    }
}
