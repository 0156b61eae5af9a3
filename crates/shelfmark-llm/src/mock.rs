//! Mock suggestion provider for testing
//!
//! Returns deterministic suggestions without network access. Each suggestion
//! kind can be scripted independently, which is how the partial-success
//! paths (one kind succeeds, another fails) get exercised in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::provider::{
    BookmarkContext, CategorySuggestion, LlmError, SuggestionProvider, SummarySuggestion,
    TagSuggestions,
};

/// What a scripted mock call should do
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Produce the canned suggestion
    Suggest,
    /// Signal upstream throttling
    RateLimited,
    /// Fail the request with a message
    Fail(String),
    /// Emulate output that did not parse as JSON
    Garbled,
}

impl MockOutcome {
    fn as_error(&self) -> Option<LlmError> {
        match self {
            MockOutcome::Suggest => None,
            MockOutcome::RateLimited => Some(LlmError::RateLimited),
            MockOutcome::Fail(message) => Some(LlmError::RequestFailed(message.clone())),
            MockOutcome::Garbled => Some(LlmError::InvalidResponse(
                "not valid JSON: expected value".to_string(),
            )),
        }
    }
}

/// A mock provider that returns predefined suggestions
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    tags_outcome: MockOutcome,
    category_outcome: MockOutcome,
    summary_outcome: MockOutcome,
    /// Simulated latency in ms
    latency_ms: u64,
    /// Total suggestion calls made
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a mock that suggests for every kind
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            tags_outcome: MockOutcome::Suggest,
            category_outcome: MockOutcome::Suggest,
            summary_outcome: MockOutcome::Suggest,
            latency_ms: 5,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that reports upstream throttling on every call
    pub fn rate_limited() -> Self {
        Self::new()
            .with_tags(MockOutcome::RateLimited)
            .with_category(MockOutcome::RateLimited)
            .with_summary(MockOutcome::RateLimited)
    }

    /// Create a mock that fails every call
    pub fn failing(message: &str) -> Self {
        let outcome = MockOutcome::Fail(message.to_string());
        Self::new()
            .with_tags(outcome.clone())
            .with_category(outcome.clone())
            .with_summary(outcome)
    }

    /// Create a mock whose output never parses as JSON
    pub fn garbled() -> Self {
        Self::new()
            .with_tags(MockOutcome::Garbled)
            .with_category(MockOutcome::Garbled)
            .with_summary(MockOutcome::Garbled)
    }

    pub fn with_tags(mut self, outcome: MockOutcome) -> Self {
        self.tags_outcome = outcome;
        self
    }

    pub fn with_category(mut self, outcome: MockOutcome) -> Self {
        self.category_outcome = outcome;
        self
    }

    pub fn with_summary(mut self, outcome: MockOutcome) -> Self {
        self.summary_outcome = outcome;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of suggestion calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    async fn run(&self, outcome: &MockOutcome) -> Result<(), LlmError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        match outcome.as_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn mock_tokens(context: &BookmarkContext) -> u32 {
        (context.title.len() / 4) as u32 + 20
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        true // Mock is always available
    }

    async fn suggest_tags(&self, context: &BookmarkContext) -> Result<TagSuggestions, LlmError> {
        self.run(&self.tags_outcome).await?;
        Ok(TagSuggestions {
            tags: vec!["technology".to_string(), "reference".to_string()],
            tokens_used: Self::mock_tokens(context),
        })
    }

    async fn suggest_category(
        &self,
        context: &BookmarkContext,
    ) -> Result<CategorySuggestion, LlmError> {
        self.run(&self.category_outcome).await?;
        Ok(CategorySuggestion {
            category: "Technology".to_string(),
            confidence: Some(0.92),
            tokens_used: Self::mock_tokens(context),
        })
    }

    async fn suggest_summary(
        &self,
        context: &BookmarkContext,
    ) -> Result<SummarySuggestion, LlmError> {
        self.run(&self.summary_outcome).await?;
        Ok(SummarySuggestion {
            summary: format!("A short overview of {}.", context.title),
            tokens_used: Self::mock_tokens(context),
        })
    }
}
