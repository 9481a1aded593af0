//! Request entry point
//!
//! Normalizes the subject, serves cached reports, and otherwise runs a
//! dialogue and stores its result. Only successful runs are cached.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::agent::{DialogueState, Orchestrator};
use crate::cache::{CacheEntry, CacheKey, DiskStore, ResultStore};
use crate::core::config::DialogueConfig;
use crate::core::{Config, Result, TradeHelperError};
use crate::llm::{OpenAiClient, ReasoningProvider};
use crate::tools::{register_finance_tools, ToolRegistry};

/// A report returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub date: NaiveDate,
    pub text: String,
    /// Served from an existing cache entry
    pub cached: bool,
}

impl Report {
    fn from_entry(entry: CacheEntry, cached: bool) -> Self {
        Self {
            subject: entry.subject,
            date: entry.date,
            text: entry.report,
            cached,
        }
    }
}

/// Produces one report per (subject, date)
pub struct ReportService {
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn ResultStore>,
    report_marker: String,
    request_timeout: Duration,
}

impl ReportService {
    /// Assemble a service from its parts
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn ResultStore>,
        config: &DialogueConfig,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            report_marker: config.report_marker.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Wire the OpenAI-compatible provider, finance tools and disk cache
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn ReasoningProvider> = Arc::new(OpenAiClient::from_config(&config.llm)?);

        let mut registry = ToolRegistry::new();
        register_finance_tools(&mut registry, &config.finance)?;

        let orchestrator = Orchestrator::new(provider, Arc::new(registry), &config.dialogue);
        let store: Arc<dyn ResultStore> = Arc::new(DiskStore::new(config.cache.dir.clone()));

        Ok(Self::new(orchestrator, store, &config.dialogue))
    }

    /// Canonical form of a free-text subject
    pub fn normalize_subject(raw: &str) -> Result<String> {
        let subject = raw.trim().to_uppercase();
        if subject.is_empty() {
            return Err(TradeHelperError::InvalidSubject(raw.to_string()));
        }
        Ok(subject)
    }

    /// Analyze `subject` as of today's local date
    pub async fn analyze(&self, subject: &str) -> Result<Report> {
        self.analyze_on(subject, Local::now().date_naive()).await
    }

    /// Analyze `subject` as of `date`
    pub async fn analyze_on(&self, subject: &str, date: NaiveDate) -> Result<Report> {
        let subject = Self::normalize_subject(subject)?;
        let key = CacheKey::new(subject.clone(), date);

        if let Some(entry) = self.store.get(&key).await? {
            tracing::info!(key = %key, "serving cached report");
            return Ok(Report::from_entry(entry, true));
        }

        let transcript = tokio::time::timeout(
            self.request_timeout,
            self.orchestrator.run(&subject, date),
        )
        .await
        .map_err(|_| {
            TradeHelperError::orchestration(format!(
                "timed out after {}s analyzing {}",
                self.request_timeout.as_secs(),
                subject
            ))
        })?;

        if let DialogueState::Failed(reason) = &transcript.state {
            if let Ok(partial) = serde_json::to_string(&transcript) {
                tracing::debug!(key = %key, transcript = %partial, "partial transcript");
            }
            return Err(TradeHelperError::orchestration(reason.clone()));
        }

        let report = transcript.report(&self.report_marker);
        let entry = CacheEntry {
            subject,
            date,
            transcript,
            report,
        };

        match self.store.put(entry.clone()).await {
            Ok(()) => Ok(Report::from_entry(entry, false)),
            Err(e) if e.is_already_exists() => {
                tracing::info!(key = %key, "another request stored this report first");
                let winner = self.store.get(&key).await?.ok_or(e)?;
                Ok(Report::from_entry(winner, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Maximum turns per dialogue
    pub fn max_turns(&self) -> usize {
        self.orchestrator.max_turns()
    }

    /// Whole-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Where results are stored
    pub fn store_description(&self) -> String {
        self.store.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_subject() {
        assert_eq!(ReportService::normalize_subject("  acme ").unwrap(), "ACME");
        assert_eq!(ReportService::normalize_subject("brk.b").unwrap(), "BRK.B");
        assert!(matches!(
            ReportService::normalize_subject("   "),
            Err(TradeHelperError::InvalidSubject(_))
        ));
    }
}
