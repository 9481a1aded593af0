//! Shared fakes for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tradehelper::core::config::DialogueConfig;
use tradehelper::core::{
    AgentRole, Message, MessageKind, Result, ToolCall, ToolDefinition, TradeHelperError,
};
use tradehelper::llm::{ReasoningProvider, Reply};
use tradehelper::tools::{FnTool, ToolRegistry};

pub const PROFILE_OUTPUT: &str = "name: ACME Corp\nindustry: Anvils\nmarketCapitalization: 1200";

/// Replies from a fixed script, then keeps talking without finishing
pub struct ScriptedAnalyst {
    script: Mutex<Vec<Reply>>,
    pub calls: AtomicUsize,
}

impl ScriptedAnalyst {
    pub fn new(mut script: Vec<Reply>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedAnalyst {
    async fn generate(&self, _: &str, _: &[Message], _: &[ToolDefinition]) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop();
        Ok(next.unwrap_or_else(|| Reply::text("Still gathering data.")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Derives its reply from the history so concurrent runs can share it
///
/// First turn fetches the profile, second writes the report, third finishes.
pub struct HistoryAnalyst {
    pub runs: AtomicUsize,
    delay: Duration,
    fail_next_run: AtomicBool,
}

impl HistoryAnalyst {
    pub fn new() -> Self {
        Self {
            runs: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_next_run: AtomicBool::new(false),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    /// Fail the first call of the next run
    pub fn failing_once() -> Self {
        Self {
            fail_next_run: AtomicBool::new(true),
            ..Self::new()
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

pub fn report_for(subject: &str) -> String {
    format!(
        "### Positive Developments\n- {subject} margins expanded\n\n\
         ### Potential Concerns\n- inventory build-up\n\n\
         ### Prediction & Analysis\nUp 1-2% next week."
    )
}

#[async_trait]
impl ReasoningProvider for HistoryAnalyst {
    async fn generate(&self, _: &str, history: &[Message], _: &[ToolDefinition]) -> Result<Reply> {
        let reasoning = history
            .iter()
            .filter(|m| m.sender == AgentRole::Initiator && m.kind == MessageKind::Reasoning)
            .count();

        if reasoning == 0 {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail_next_run.swap(false, Ordering::SeqCst) {
                return Err(TradeHelperError::llm("upstream returned 503"));
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(match reasoning {
            0 => Reply::with_tool_calls(
                "",
                vec![ToolCall::new(
                    "call_profile",
                    "get_company_profile",
                    json!({ "symbol": "ACME" }),
                )],
            ),
            1 => Reply::text(report_for("ACME")),
            _ => Reply::text("TERMINATE"),
        })
    }

    fn name(&self) -> &str {
        "history"
    }
}

/// Sleeps far past any request timeout used in tests
pub struct StalledAnalyst;

#[async_trait]
impl ReasoningProvider for StalledAnalyst {
    async fn generate(&self, _: &str, _: &[Message], _: &[ToolDefinition]) -> Result<Reply> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Reply::text("TERMINATE"))
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// Registry with a fake `get_company_profile` counting its invocations
pub fn profile_registry(invocations: Arc<AtomicUsize>) -> ToolRegistry {
    let definition = ToolDefinition::function(
        "get_company_profile",
        "Get a company profile",
        json!({
            "type": "object",
            "properties": { "symbol": { "type": "string" } },
            "required": ["symbol"]
        }),
    );

    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(FnTool::new(definition, move |_args: Value| {
            let invocations = invocations.clone();
            async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok(PROFILE_OUTPUT.to_string())
            }
        })))
        .unwrap();
    registry
}

pub fn dialogue_config(max_turns: usize) -> DialogueConfig {
    DialogueConfig {
        max_turns,
        request_timeout_secs: 30,
        ..DialogueConfig::default()
    }
}
