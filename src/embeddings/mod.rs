//! Embeddings generation module
//!
//! This module provides functionality for generating text embeddings using various providers:
//! - OpenAI-compatible endpoints (text-embedding-3-small, etc.)
//! - Ollama (local models such as nomic-embed-text)
//!
//! # Examples
//!
//! ```rust,no_run
//! use eventrag::embeddings::EmbeddingService;
//! use eventrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("running shoes under $100").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;

use crate::errors::EventRagError;
use crate::errors::Result;

/// Default embedding dimension, matching the store's vector column width
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Longest text submitted to an embedding endpoint, in characters
pub const MAX_EMBEDDING_CHARS: usize = 8000;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        // Infer the provider from the endpoint; a local endpoint is assumed
        // to speak the Ollama API, anything with a key the OpenAI one
        let provider = if config.embedding_endpoint().contains("api.openai.com") {
            EmbeddingProvider::OpenAI
        } else if config.embedding_endpoint().contains("localhost")
            || config.embedding_endpoint().contains("127.0.0.1")
        {
            EmbeddingProvider::Ollama
        } else if config.embedding_api_key().is_empty() {
            EmbeddingProvider::Ollama
        } else {
            EmbeddingProvider::OpenAI
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embedding_endpoint().to_string(),
            api_key: if config.embedding_api_key().is_empty() {
                None
            } else {
                Some(config.embedding_api_key().to_string())
            },
        }
    }
}

/// Normalize text before submitting it to an embedding endpoint.
///
/// Newlines and repeated whitespace collapse to single spaces; overlong
/// inputs are truncated. Empty text is an error the caller must decide on.
pub fn preprocess_text(text: &str) -> Result<String> {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EventRagError::Embedding(
            "cannot embed empty text".to_string(),
        ));
    }
    if collapsed.chars().count() > MAX_EMBEDDING_CHARS {
        return Ok(collapsed.chars().take(MAX_EMBEDDING_CHARS).collect());
    }
    Ok(collapsed)
}

/// Reject malformed vectors before they reach the store
pub fn validate_embedding(embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(EventRagError::InvalidEmbedding(
            "embedding is empty".to_string(),
        ));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(EventRagError::InvalidEmbedding(
            "embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_collapses_whitespace() {
        let processed = preprocess_text("running\nshoes\t\t under  $100").unwrap();
        assert_eq!(processed, "running shoes under $100");
    }

    #[test]
    fn test_preprocess_rejects_empty_text() {
        assert!(preprocess_text("   \n\t ").is_err());
    }

    #[test]
    fn test_preprocess_truncates_overlong_text() {
        let long = "word ".repeat(4000);
        let processed = preprocess_text(&long).unwrap();
        assert_eq!(processed.chars().count(), MAX_EMBEDDING_CHARS);
    }

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.1, -0.2, 0.3]).is_ok());
        assert!(validate_embedding(&[]).is_err());
        assert!(validate_embedding(&[0.1, f32::NAN]).is_err());
        assert!(validate_embedding(&[f32::INFINITY]).is_err());
    }
}
