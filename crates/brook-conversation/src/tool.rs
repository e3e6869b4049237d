//! Tool definitions and the tracker that mirrors invocations into the transcript.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use brook_chat::ToolStatus;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::conversation::Shared;

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Payload handed back to the runner (and typically to the model)
    pub content: serde_json::Value,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: serde_json::Value::String(text.into()),
            is_error: false,
        }
    }

    /// Create a successful structured result
    pub fn json(content: serde_json::Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: serde_json::Value::String(message.into()),
            is_error: true,
        }
    }

    /// The part status this result settles to
    pub fn status(&self) -> ToolStatus {
        if self.is_error {
            ToolStatus::Error
        } else {
            ToolStatus::Done
        }
    }
}

/// Trait for executable tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in API calls and shown on the tool part)
    fn name(&self) -> &str;

    /// Tool description for the LLM
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments
    async fn execute(&self, arguments: serde_json::Value, cancel: CancellationToken) -> ToolResult;
}

/// Type alias for a boxed tool
pub type BoxedTool = Arc<dyn Tool>;

/// A tool definition in the form backends consume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The tools available to one conversation, with compiled schema validators.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<BoxedTool>,
    /// Cached compiled JSON schema validators keyed by tool name
    schema_cache: HashMap<String, Arc<jsonschema::Validator>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, compiling and caching its schema validator
    pub fn add(&mut self, tool: BoxedTool) {
        let schema = tool.parameters_schema();
        match jsonschema::validator_for(&schema) {
            Ok(validator) => {
                self.schema_cache
                    .insert(tool.name().to_string(), Arc::new(validator));
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    tool.name(),
                    e
                );
            }
        }
        self.tools.push(tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tool definitions in the form backends consume
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Validate arguments against a tool's cached schema.
    /// Returns `Some(error_message)` if validation fails, `None` if valid
    /// (or when no validator could be compiled for the tool).
    pub fn validate(&self, name: &str, arguments: &serde_json::Value) -> Option<String> {
        let validator = self.schema_cache.get(name)?;
        let errors: Vec<String> = validator
            .iter_errors(arguments)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();

        if errors.is_empty() {
            None
        } else {
            Some(format!(
                "Tool argument validation failed:\n{}",
                errors.join("\n")
            ))
        }
    }
}

/// Records tool invocations as parts of the active assistant message.
///
/// `begin` appends a pending part synchronously, before any side effect of
/// the call runs, so the invocation is visible at call position. `finish`
/// settles it once; late or repeated settles are ignored. Both are safe to
/// call after the turn is gone, they just stop recording.
#[derive(Clone)]
pub struct ToolTracker {
    shared: Arc<Shared>,
    assistant_id: String,
}

impl ToolTracker {
    pub(crate) fn new(shared: Arc<Shared>, assistant_id: String) -> Self {
        Self {
            shared,
            assistant_id,
        }
    }

    /// The message tool parts are recorded on
    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    /// Record a pending invocation, returning its part id
    pub fn begin(&self, tool_name: &str, arguments: Option<serde_json::Value>) -> String {
        self.shared
            .begin_tool(&self.assistant_id, tool_name, arguments)
    }

    /// Settle a previously recorded invocation
    pub fn finish(&self, part_id: &str, status: ToolStatus) {
        self.shared.finish_tool(&self.assistant_id, part_id, status);
    }

    /// Run a tool from the set with tracking: the part goes pending before
    /// execution and settles from the result afterwards.
    pub async fn execute(
        &self,
        tools: &ToolSet,
        tool_name: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> ToolResult {
        let part_id = self.begin(tool_name, Some(arguments.clone()));

        let result = match tools.get(tool_name) {
            Some(tool) => match tools.validate(tool_name, &arguments) {
                Some(err) => ToolResult::error(err),
                None => tool.execute(arguments, cancel).await,
            },
            None => ToolResult::error(format!("Tool not found: {}", tool_name)),
        };

        self.finish(&part_id, result.status());
        result
    }
}
