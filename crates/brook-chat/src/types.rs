//! Core types for conversation messages and their parts

use serde::{Deserialize, Serialize};

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// One item of a multimodal message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Text content
    Text { text: String },
    /// Image reference (data URI or URL), passed through opaquely
    Image { image: String },
}

impl ContentItem {
    /// Create a text item
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image item from a data URI or URL
    pub fn image(image: impl Into<String>) -> Self {
        Self::Image {
            image: image.into(),
        }
    }

    /// Get text if this is a text item
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Lifecycle status of a tool part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Execution started, outcome not yet known
    Pending,
    /// Execution completed successfully
    Done,
    /// Execution failed
    Error,
}

/// The two part kinds that accumulate streamed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Text,
    Reasoning,
}

/// One typed, ordered fragment of an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain answer text
    Text { id: String, content: String },
    /// Intermediate thinking text, kept separate so the UI can collapse it
    Reasoning { id: String, content: String },
    /// A tool invocation and its visible status
    Tool {
        id: String,
        tool_name: String,
        status: ToolStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        args: Option<serde_json::Value>,
    },
}

impl Part {
    /// Create a text part seeded with content
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            id: fresh_id(),
            content: content.into(),
        }
    }

    /// Create a reasoning part seeded with content
    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::Reasoning {
            id: fresh_id(),
            content: content.into(),
        }
    }

    /// Create a pending tool part
    pub fn tool(tool_name: impl Into<String>, args: Option<serde_json::Value>) -> Self {
        Self::Tool {
            id: fresh_id(),
            tool_name: tool_name.into(),
            status: ToolStatus::Pending,
            args,
        }
    }

    /// Create an accumulating part of the given kind
    pub fn fragment(kind: FragmentKind, content: impl Into<String>) -> Self {
        match kind {
            FragmentKind::Text => Self::text(content),
            FragmentKind::Reasoning => Self::reasoning(content),
        }
    }

    /// The part's id
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::Reasoning { id, .. } | Self::Tool { id, .. } => id,
        }
    }

    /// The accumulating kind, if this part accumulates text
    pub fn fragment_kind(&self) -> Option<FragmentKind> {
        match self {
            Self::Text { .. } => Some(FragmentKind::Text),
            Self::Reasoning { .. } => Some(FragmentKind::Reasoning),
            Self::Tool { .. } => None,
        }
    }

    /// Get the accumulated content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Get the accumulated content if this is a reasoning part
    pub fn as_reasoning(&self) -> Option<&str> {
        match self {
            Self::Reasoning { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Check if this is a tool part
    pub fn is_tool(&self) -> bool {
        matches!(self, Self::Tool { .. })
    }
}

/// Message body: static content or streaming-capable parts.
///
/// A message is either static (text or multimodal items, fixed at creation)
/// or parts-bearing (an assistant message whose parts grow during a turn).
/// The exclusivity is encoded in the type rather than checked at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain text content
    Text(String),
    /// Multimodal content items
    Items(Vec<ContentItem>),
    /// Ordered typed parts; order is the on-screen reading order
    Parts(Vec<Part>),
}

impl MessageBody {
    /// The parts, if this is a parts-bearing body
    pub fn parts(&self) -> Option<&[Part]> {
        match self {
            Self::Parts(parts) => Some(parts),
            _ => None,
        }
    }

    pub(crate) fn parts_mut(&mut self) -> Option<&mut Vec<Part>> {
        match self {
            Self::Parts(parts) => Some(parts),
            _ => None,
        }
    }
}

/// A conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique identifier, immutable after creation
    pub id: String,
    /// Message role, immutable after creation
    pub role: Role,
    /// Static content or growing parts
    #[serde(flatten)]
    pub body: MessageBody,
    /// Optional rendering hint (e.g. "problem_context"); never read by the core
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    /// Creation time, milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    fn new(role: Role, body: MessageBody) -> Self {
        Self {
            id: fresh_id(),
            role,
            body,
            display_type: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a user message with plain text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageBody::Text(text.into()))
    }

    /// Create a user message with multimodal content items
    pub fn user_items(items: Vec<ContentItem>) -> Self {
        Self::new(Role::User, MessageBody::Items(items))
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, MessageBody::Text(text.into()))
    }

    /// Create an assistant message with empty parts, ready to receive a stream
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, MessageBody::Parts(Vec::new()))
    }

    /// Attach a rendering hint
    pub fn with_display_type(mut self, display_type: impl Into<String>) -> Self {
        self.display_type = Some(display_type.into());
        self
    }

    /// The parts, if this message carries any
    pub fn parts(&self) -> Option<&[Part]> {
        self.body.parts()
    }

    /// Readable text of the message body.
    ///
    /// Parts-bearing bodies contribute text parts only; item bodies
    /// contribute text items only.
    pub fn text(&self) -> String {
        match &self.body {
            MessageBody::Text(text) => text.clone(),
            MessageBody::Items(items) => items
                .iter()
                .filter_map(|i| i.as_text())
                .collect::<Vec<_>>()
                .join("\n"),
            MessageBody::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.as_text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Input accepted by a conversation's send operation
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    /// Plain text
    Text(String),
    /// Structured multimodal content
    Items(Vec<ContentItem>),
}

impl UserInput {
    /// Whether this input carries nothing worth sending
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Items(items) => items.is_empty(),
        }
    }

    /// Build the user message for this input, trimming plain text
    pub fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::user(text.trim()),
            Self::Items(items) => Message::user_items(items),
        }
    }
}

impl From<&str> for UserInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for UserInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ContentItem>> for UserInput {
    fn from(items: Vec<ContentItem>) -> Self {
        Self::Items(items)
    }
}

/// Generate a fresh opaque id
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
