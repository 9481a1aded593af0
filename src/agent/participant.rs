//! Dialogue participants

use crate::core::AgentRole;

/// A named agent with a fixed role and directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    name: String,
    role: AgentRole,
    directive: String,
}

impl Participant {
    /// The reasoning agent
    pub fn initiator(name: impl Into<String>, directive: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: AgentRole::Initiator,
            directive: directive.into(),
        }
    }

    /// The tool-executing agent; it has no directive of its own
    pub fn proxy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: AgentRole::Proxy,
            directive: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }
}
