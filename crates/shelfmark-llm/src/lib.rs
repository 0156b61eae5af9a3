//! # Shelfmark LLM
//!
//! LLM suggestion providers for the Shelfmark bookmark manager.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI-compatible | API | `OPENAI_API_KEY` |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use shelfmark_llm::{BookmarkContext, MockProvider, SuggestionProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Use mock provider for testing
//!     let llm = MockProvider::new();
//!
//!     let context = BookmarkContext::new("Rust Book", "https://doc.rust-lang.org/book/");
//!     let tags = llm.suggest_tags(&context).await.unwrap();
//!     println!("{:?}", tags.tags);
//! }
//! ```
//!
//! Provider output is expected to be strict JSON; a Markdown code fence
//! around it is tolerated, anything else is reported as an invalid response
//! and treated by consumers as "no suggestion".

pub mod config;
pub mod extract;
pub mod metrics;
pub mod mock;
pub mod openai;
pub mod provider;

pub use config::LlmConfig;
pub use extract::{extract_json, extract_typed};
pub use metrics::{Metrics, MetricsSnapshot};
pub use mock::{MockOutcome, MockProvider};
pub use openai::OpenAIProvider;
pub use provider::{
    BookmarkContext, CategorySuggestion, LlmError, SuggestionProvider, SummarySuggestion,
    TagSuggestions,
};
