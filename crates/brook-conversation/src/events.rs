//! Conversation event types

use brook_chat::{Message, ToolStatus};
use serde::{Deserialize, Serialize};

use crate::conversation::TurnOutcome;

/// Events emitted while a conversation turn runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A send was accepted: the user message and the assistant placeholder
    /// were appended together
    TurnStart {
        user_message: Message,
        assistant_id: String,
    },

    /// The active assistant message changed; carries a full snapshot
    MessageUpdate { message: Message },

    /// A tool invocation was recorded as pending
    ToolStart {
        part_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// A tool invocation settled
    ToolEnd {
        part_id: String,
        tool_name: String,
        status: ToolStatus,
    },

    /// The turn finished; no further events for this send
    TurnEnd { outcome: TurnOutcome },
}

impl ConversationEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationEvent::TurnEnd { .. })
    }
}
