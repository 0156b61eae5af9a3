//! OpenAI-compatible suggestion provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::extract::extract_typed;
use crate::provider::{
    BookmarkContext, CategorySuggestion, LlmError, SuggestionProvider, SummarySuggestion,
    TagSuggestions,
};

const TAGS_SYSTEM: &str = "You tag bookmarks for a personal bookmark manager. \
    Respond with only JSON of the form {\"tags\": [\"tag\", ...]}. \
    Suggest at most 5 short lowercase tags and skip any tag the user already has.";

const CATEGORY_SYSTEM: &str = "You categorize bookmarks for a personal bookmark manager. \
    Respond with only JSON of the form {\"category\": \"...\", \"confidence\": 0.0}. \
    Pick a single short category name and a confidence between 0 and 1.";

const SUMMARY_SYSTEM: &str = "You summarize bookmarked pages from their title, URL and \
    description. Respond with only JSON of the form {\"summary\": \"...\"}. \
    Keep the summary to two or three sentences.";

/// Chat completion request format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Chat completion response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Model output shapes for the three suggestion kinds
#[derive(Debug, Deserialize)]
struct TagsPayload {
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryPayload {
    category: String,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    summary: String,
}

/// Suggestion provider backed by an OpenAI-compatible chat completions API
#[derive(Debug)]
pub struct OpenAIProvider {
    /// API key
    api_key: String,
    /// Model to use (e.g., "gpt-4o-mini")
    model: String,
    /// HTTP client
    client: reqwest::Client,
    /// Base URL
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new provider against api.openai.com
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com".to_string(),
        }
    }

    /// Point the provider at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn complete(
        &self,
        system: &str,
        prompt: String,
        max_tokens: u32,
    ) -> Result<(String, u32), LlmError> {
        let start = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.3,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        let tokens_used = api_response.usage.map(|u| u.total_tokens).unwrap_or(0);

        debug!(
            model = %self.model,
            tokens = tokens_used,
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        Ok((content, tokens_used))
    }

    fn render_context(context: &BookmarkContext) -> String {
        let mut prompt = format!("Title: {}\nURL: {}", context.title, context.url);
        if let Some(description) = &context.description {
            prompt.push_str("\nDescription: ");
            prompt.push_str(description);
        }
        if !context.existing_tags.is_empty() {
            prompt.push_str("\nExisting tags: ");
            prompt.push_str(&context.existing_tags.join(", "));
        }
        prompt
    }
}

#[async_trait]
impl SuggestionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .is_ok()
    }

    async fn suggest_tags(&self, context: &BookmarkContext) -> Result<TagSuggestions, LlmError> {
        let prompt = Self::render_context(context);
        let (content, tokens_used) = self.complete(TAGS_SYSTEM, prompt, 128).await?;

        let payload: TagsPayload = extract_typed(&content)?;
        let tags: Vec<String> = payload
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .take(5)
            .collect();

        Ok(TagSuggestions { tags, tokens_used })
    }

    async fn suggest_category(
        &self,
        context: &BookmarkContext,
    ) -> Result<CategorySuggestion, LlmError> {
        let prompt = Self::render_context(context);
        let (content, tokens_used) = self.complete(CATEGORY_SYSTEM, prompt, 64).await?;

        let payload: CategoryPayload = extract_typed(&content)?;
        Ok(CategorySuggestion {
            category: payload.category.trim().to_string(),
            confidence: payload.confidence,
            tokens_used,
        })
    }

    async fn suggest_summary(
        &self,
        context: &BookmarkContext,
    ) -> Result<SummarySuggestion, LlmError> {
        let prompt = Self::render_context(context);
        let (content, tokens_used) = self.complete(SUMMARY_SYSTEM, prompt, 256).await?;

        let payload: SummaryPayload = extract_typed(&content)?;
        Ok(SummarySuggestion {
            summary: payload.summary.trim().to_string(),
            tokens_used,
        })
    }
}
