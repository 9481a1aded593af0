//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::core::{Result, ToolCall, ToolDefinition, ToolOutcome, TradeHelperError};

/// A callable capability the proxy agent can execute
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with already-validated arguments
    async fn invoke(&self, args: &Value) -> Result<String>;
}

/// Adapter turning an async closure into a [`Tool`]
pub struct FnTool<F> {
    definition: ToolDefinition,
    handler: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    /// Wrap `handler` under `definition`
    pub fn new(definition: ToolDefinition, handler: F) -> Self {
        Self {
            definition,
            handler,
        }
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        (self.handler)(args.clone()).await
    }
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition's name
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().function.name;
        if self.tools.contains_key(&name) {
            return Err(TradeHelperError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get all tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `args` and invoke the named tool
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| TradeHelperError::UnknownTool(name.to_string()))?;

        let definition = tool.definition();
        validate_arguments(&definition.function.parameters, args)
            .map_err(|reason| TradeHelperError::invalid_arguments(name, reason))?;

        tool.invoke(args)
            .await
            .map_err(|e| TradeHelperError::tool_execution(name, e))
    }

    /// Execute a tool call, reporting any failure as a failed outcome
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match self.invoke(&call.name, &call.arguments).await {
            Ok(output) => ToolOutcome::success(call, output),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                ToolOutcome::failure(call, e.to_string())
            }
        }
    }

    /// Execute several calls concurrently, keeping call order in the results
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolOutcome> {
        join_all(calls.iter().map(|call| self.execute(call))).await
    }
}

/// Check `args` against the subset of JSON Schema used by tool definitions
pub fn validate_arguments(schema: &Value, args: &Value) -> std::result::Result<(), String> {
    let args = match args {
        Value::Object(map) => map,
        Value::Null => return validate_arguments(schema, &Value::Object(Default::default())),
        other => return Err(format!("expected an object, got {}", json_type(other))),
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(format!("missing required field: {}", field));
            }
        }
    }

    let properties = schema.get("properties").and_then(|v| v.as_object());
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in args {
        let declared = properties.and_then(|p| p.get(key));
        match declared {
            Some(prop) => {
                if let Some(expected) = prop.get("type").and_then(|t| t.as_str()) {
                    if !matches_type(expected, value) {
                        return Err(format!(
                            "field '{}' must be {}, got {}",
                            key,
                            expected,
                            json_type(value)
                        ));
                    }
                }
            }
            None if closed => return Err(format!("unexpected field: {}", key)),
            None => {}
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        // Unknown schema types are not enforced
        _ => true,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
