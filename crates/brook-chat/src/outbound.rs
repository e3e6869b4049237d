//! Mapping from the transcript to the history replayed to the model.
//!
//! Reasoning and tool parts stay local: the model only ever sees the plain
//! text it produced, so assistant part messages collapse to their text parts
//! joined with newlines. Multimodal user content is forwarded structurally.

use serde::{Deserialize, Serialize};

use crate::types::{ContentItem, Message, MessageBody, Part, Role};

/// Role of an outbound history item. Tool-role transcript messages have no
/// outbound representation and are dropped during mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundRole {
    User,
    Assistant,
    System,
}

/// Content of an outbound history item: a plain string or structured items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundContent {
    Text(String),
    Items(Vec<ContentItem>),
}

impl OutboundContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Items(_) => None,
        }
    }
}

/// One `{role, content}` pair sent to the model backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub role: OutboundRole,
    pub content: OutboundContent,
}

impl OutboundMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: OutboundRole::System,
            content: OutboundContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: OutboundRole::User,
            content: OutboundContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: OutboundRole::Assistant,
            content: OutboundContent::Text(text.into()),
        }
    }
}

/// Map the message list to outbound history, prepending the system prompt
/// when one is configured.
pub fn build_history(messages: &[Message], system_prompt: Option<&str>) -> Vec<OutboundMessage> {
    let mut history = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt {
        history.push(OutboundMessage::system(prompt));
    }
    for message in messages {
        let Some(role) = outbound_role(message.role) else {
            continue;
        };
        let content = match &message.body {
            MessageBody::Text(text) => OutboundContent::Text(text.clone()),
            MessageBody::Items(items) => OutboundContent::Items(items.clone()),
            MessageBody::Parts(parts) => OutboundContent::Text(joined_text(parts)),
        };
        history.push(OutboundMessage { role, content });
    }
    history
}

fn outbound_role(role: Role) -> Option<OutboundRole> {
    match role {
        Role::User => Some(OutboundRole::User),
        Role::Assistant => Some(OutboundRole::Assistant),
        Role::System => Some(OutboundRole::System),
        Role::Tool => None,
    }
}

fn joined_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use crate::types::{FragmentKind, ToolStatus};
    use serde_json::json;

    #[test]
    fn test_assistant_parts_collapse_to_text_only() {
        let mut t = Transcript::new();
        t.push_user("question".into());
        let id = t.push_assistant_placeholder();
        t.append_or_extend(&id, FragmentKind::Reasoning, "thinking");
        t.append_or_extend(&id, FragmentKind::Text, "first");
        let part = t.add_tool_part(&id, "EditComponent", None);
        t.finish_tool_part(&id, &part, ToolStatus::Done);
        t.append_or_extend(&id, FragmentKind::Text, "second");

        let history = build_history(t.messages(), None);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0], OutboundMessage::user("question"));
        assert_eq!(history[1], OutboundMessage::assistant("first\nsecond"));
    }

    #[test]
    fn test_system_prompt_prepended() {
        let mut t = Transcript::new();
        t.push_user("hi".into());

        let history = build_history(t.messages(), Some("be brief"));

        assert_eq!(history[0], OutboundMessage::system("be brief"));
        assert_eq!(history[1], OutboundMessage::user("hi"));
    }

    #[test]
    fn test_multimodal_items_pass_through() {
        let items = vec![
            ContentItem::text("what is this"),
            ContentItem::image("data:image/png;base64,AAAA"),
        ];
        let mut t = Transcript::new();
        t.push_user(items.clone().into());

        let history = build_history(t.messages(), None);

        assert_eq!(history[0].role, OutboundRole::User);
        assert_eq!(history[0].content, OutboundContent::Items(items));
    }

    #[test]
    fn test_tool_role_messages_dropped() {
        let mut t = Transcript::new();
        t.push(Message::user("hi"));
        let mut tool_msg = Message::user("result");
        tool_msg.role = Role::Tool;
        t.push(tool_msg);

        let history = build_history(t.messages(), None);

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, OutboundRole::User);
    }

    #[test]
    fn test_assistant_without_text_parts_maps_to_empty() {
        let mut t = Transcript::new();
        let id = t.push_assistant_placeholder();
        t.append_or_extend(&id, FragmentKind::Reasoning, "only thinking");

        let history = build_history(t.messages(), None);

        assert_eq!(history[0], OutboundMessage::assistant(""));
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(OutboundMessage::assistant("a\nb")).unwrap();
        assert_eq!(value, json!({ "role": "assistant", "content": "a\nb" }));

        let value = serde_json::to_value(OutboundMessage {
            role: OutboundRole::User,
            content: OutboundContent::Items(vec![ContentItem::text("hi")]),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "role": "user", "content": [{ "type": "text", "text": "hi" }] })
        );
    }
}
