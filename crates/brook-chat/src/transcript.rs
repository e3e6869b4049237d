//! The ordered message list for one conversation and its mutation operations.
//!
//! All mutation operations are total: a missing message or part means there
//! is nothing to do, never an error. Completions can arrive after a turn was
//! torn down, so absence is an expected state.

use serde::{Deserialize, Serialize};

use crate::reconcile;
use crate::types::{fresh_id, FragmentKind, Message, Part, ToolStatus, UserInput};

/// Append-only, ordered conversation transcript.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript seeded with restored history
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message as-is
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the whole transcript with restored history
    pub fn seed(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Append a user message built from the given input. Returns its id.
    pub fn push_user(&mut self, input: UserInput) -> String {
        let message = input.into_message();
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append an empty assistant message ready to receive a stream. Returns its id.
    pub fn push_assistant_placeholder(&mut self) -> String {
        let message = Message::assistant_placeholder();
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Route a streamed fragment into the target message.
    ///
    /// Extends the trailing part when its kind matches, reconciling the
    /// fragment against the already accumulated content; otherwise appends a
    /// fresh part of that kind. Consecutive same-kind fragments therefore
    /// coalesce, while a kind change (or an intervening tool part) starts a
    /// new part, preserving interleaving order.
    pub fn append_or_extend(&mut self, message_id: &str, kind: FragmentKind, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        let Some(parts) = self.parts_mut(message_id) else {
            return;
        };

        match parts.last_mut() {
            Some(Part::Text { content, .. }) if kind == FragmentKind::Text => {
                let appendage = reconcile::merge(content, fragment);
                content.push_str(appendage);
            }
            Some(Part::Reasoning { content, .. }) if kind == FragmentKind::Reasoning => {
                let appendage = reconcile::merge(content, fragment);
                content.push_str(appendage);
            }
            _ => parts.push(Part::fragment(kind, fragment)),
        }
    }

    /// Append a pending tool part at the current end of the target message.
    ///
    /// Tool parts are never coalesced; their position records where in the
    /// streamed output the call occurred. A fresh part id is returned even
    /// when the target message is gone, in which case nothing is recorded.
    pub fn add_tool_part(
        &mut self,
        message_id: &str,
        tool_name: &str,
        args: Option<serde_json::Value>,
    ) -> String {
        let part_id = fresh_id();
        let Some(parts) = self.parts_mut(message_id) else {
            return part_id;
        };
        parts.push(Part::Tool {
            id: part_id.clone(),
            tool_name: tool_name.to_string(),
            status: ToolStatus::Pending,
            args,
        });
        part_id
    }

    /// Settle a tool part to `Done` or `Error`. Returns whether the part
    /// actually transitioned.
    ///
    /// Only a `Pending` part transitions; a part that already settled keeps
    /// its first outcome. Requesting `Pending` is ignored, as is a part or
    /// message that no longer exists.
    pub fn finish_tool_part(
        &mut self,
        message_id: &str,
        part_id: &str,
        status: ToolStatus,
    ) -> bool {
        if status == ToolStatus::Pending {
            return false;
        }
        let Some(parts) = self.parts_mut(message_id) else {
            return false;
        };
        for part in parts.iter_mut() {
            if let Part::Tool {
                id, status: current, ..
            } = part
            {
                if id == part_id && *current == ToolStatus::Pending {
                    *current = status;
                    return true;
                }
            }
        }
        false
    }

    /// Replace the trailing text of the target message with `text`.
    ///
    /// If the last part is a text part its content is overwritten; otherwise
    /// a new text part is appended. Reasoning and tool parts are left
    /// untouched either way.
    pub fn overwrite_trailing_text(&mut self, message_id: &str, text: &str) {
        let Some(parts) = self.parts_mut(message_id) else {
            return;
        };
        match parts.last_mut() {
            Some(Part::Text { content, .. }) => {
                content.clear();
                content.push_str(text);
            }
            _ => parts.push(Part::text(text)),
        }
    }

    /// Find a message by id
    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// An owned copy of the message list
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn parts_mut(&mut self, message_id: &str) -> Option<&mut Vec<Part>> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .and_then(|m| m.body.parts_mut())
    }
}
