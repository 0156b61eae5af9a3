//! Integration tests that require a real LLM API
//!
//! These tests are marked with #[ignore] and require environment variables:
//! - OPENAI_API_KEY for OpenAI tests
//!
//! Run with: cargo test -p shelfmark-llm --test provider_integration -- --ignored

use shelfmark_llm::{BookmarkContext, LlmConfig, OpenAIProvider, SuggestionProvider};

fn provider_from_env() -> OpenAIProvider {
    let config = LlmConfig::from_env();
    let api_key = config
        .openai_api_key
        .expect("OPENAI_API_KEY must be set for this test");
    OpenAIProvider::new(&api_key, &config.model).with_base_url(&config.base_url)
}

#[tokio::test]
#[ignore = "Requires OPENAI_API_KEY"]
async fn test_real_tag_suggestions() {
    let provider = provider_from_env();
    assert!(provider.is_available().await, "provider should be reachable");

    let context = BookmarkContext {
        title: "The Rust Programming Language".to_string(),
        url: "https://doc.rust-lang.org/book/".to_string(),
        description: Some("Official book on the Rust language".to_string()),
        existing_tags: vec!["books".to_string()],
    };

    let suggestions = provider
        .suggest_tags(&context)
        .await
        .expect("tag suggestion should succeed");

    assert!(!suggestions.tags.is_empty());
    assert!(suggestions.tags.len() <= 5);
    assert!(suggestions.tokens_used > 0);
}

#[tokio::test]
#[ignore = "Requires OPENAI_API_KEY"]
async fn test_real_category_and_summary() {
    let provider = provider_from_env();

    let context = BookmarkContext::new(
        "Baking sourdough at home",
        "https://example.com/sourdough-guide",
    );

    let category = provider
        .suggest_category(&context)
        .await
        .expect("category suggestion should succeed");
    assert!(!category.category.is_empty());

    let summary = provider
        .suggest_summary(&context)
        .await
        .expect("summary suggestion should succeed");
    assert!(!summary.summary.is_empty());
}
