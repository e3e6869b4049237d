//! Classification of raw provider stream events.
//!
//! Providers disagree about where delta text lives (`text`, `textDelta`,
//! `delta.text`, `delta.output_text`) and about event tag vocabulary, so the
//! envelope keeps every known slot optional and classification works on
//! whichever is present. Events that carry no usable payload are ignored
//! rather than rejected; an unknown tag is not an error.

use serde::{Deserialize, Serialize};

/// One event from a provider's raw stream, permissively decoded.
///
/// Unknown fields are dropped on deserialization; only the slots that can
/// carry delta text are retained alongside the tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawStreamEvent {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "textDelta", skip_serializing_if = "Option::is_none")]
    pub text_delta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<RawDelta>,
}

/// Nested delta object used by providers that wrap their payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
}

impl RawStreamEvent {
    /// A `text-delta` event carrying its payload in the `text` slot
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self {
            event_type: "text-delta".to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A `reasoning-delta` event carrying its payload in the `text` slot
    pub fn reasoning_delta(text: impl Into<String>) -> Self {
        Self {
            event_type: "reasoning-delta".to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// An event with only a tag, such as `step-start` or `finish`
    pub fn tagged(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// The delta payload: the first non-empty slot in priority order.
    ///
    /// Slot order is `text`, `textDelta`, `delta.text`, `delta.output_text`.
    /// Present-but-empty slots are skipped, never shadowing a later slot.
    pub fn payload(&self) -> Option<&str> {
        let delta = self.delta.as_ref();
        [
            self.text.as_deref(),
            self.text_delta.as_deref(),
            delta.and_then(|d| d.text.as_deref()),
            delta.and_then(|d| d.output_text.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
    }
}

/// What a raw event means for the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Visible answer text to route into the assistant message
    Text(&'a str),
    /// Model reasoning to route into the assistant message
    Reasoning(&'a str),
    /// Anything else: lifecycle markers, tool chatter, empty deltas
    Ignored,
}

/// Classify a raw event by substring-matching its tag.
///
/// `reasoning` is checked before `text` so that tags naming both resolve to
/// reasoning. Events without a payload are ignored whatever their tag says.
pub fn classify(event: &RawStreamEvent) -> Classified<'_> {
    let Some(payload) = event.payload() else {
        return Classified::Ignored;
    };
    if event.event_type.contains("reasoning") {
        Classified::Reasoning(payload)
    } else if event.event_type.contains("text") {
        Classified::Text(payload)
    } else {
        Classified::Ignored
    }
}
