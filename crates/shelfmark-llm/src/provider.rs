//! Suggestion provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from suggestion providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Provider not available")]
    NotAvailable,
}

/// The bookmark a suggestion is asked about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkContext {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags the user already applied; lets the model avoid duplicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub existing_tags: Vec<String>,
}

impl BookmarkContext {
    /// Create a context with just title and URL
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            description: None,
            existing_tags: Vec::new(),
        }
    }
}

/// Suggested tags for a bookmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSuggestions {
    pub tags: Vec<String>,
    pub tokens_used: u32,
}

/// Suggested category for a bookmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    /// Model self-reported confidence, when the provider surfaces one
    pub confidence: Option<f32>,
    pub tokens_used: u32,
}

/// Suggested summary of a bookmarked page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySuggestion {
    pub summary: String,
    pub tokens_used: u32,
}

/// Trait for suggestion providers
#[async_trait]
pub trait SuggestionProvider: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Suggest tags for a bookmark
    async fn suggest_tags(&self, context: &BookmarkContext) -> Result<TagSuggestions, LlmError>;

    /// Suggest a category for a bookmark
    async fn suggest_category(
        &self,
        context: &BookmarkContext,
    ) -> Result<CategorySuggestion, LlmError>;

    /// Summarize a bookmarked page
    async fn suggest_summary(
        &self,
        context: &BookmarkContext,
    ) -> Result<SummarySuggestion, LlmError>;
}
