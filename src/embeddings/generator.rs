//! Embedding generation service with preprocessing and batch support

use std::sync::Arc;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::Result;

/// Service facade over the provider clients
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config))
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Generate a validated embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let processed = crate::embeddings::preprocess_text(text)?;
        let embedding = self.client.generate(&processed).await?;
        crate::embeddings::validate_embedding(&embedding)?;
        Ok(embedding)
    }

    /// Generate embeddings for multiple texts in batch.
    ///
    /// Texts that are empty after preprocessing yield zero vectors in their
    /// original positions rather than failing the whole batch.
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut processed_texts = Vec::new();
        let mut empty_positions = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match crate::embeddings::preprocess_text(text) {
                Ok(processed) => processed_texts.push(processed),
                Err(_) => {
                    empty_positions.push(i);
                }
            }
        }

        let embeddings = if processed_texts.is_empty() {
            Vec::new()
        } else if processed_texts.len() <= MAX_BATCH_SIZE {
            self.client
                .generate_batch(
                    processed_texts
                        .iter()
                        .map(std::string::String::as_str)
                        .collect(),
                )
                .await?
        } else {
            // Split into chunks
            let mut all_embeddings = Vec::new();
            for chunk in processed_texts.chunks(MAX_BATCH_SIZE) {
                let chunk_embeddings = self
                    .client
                    .generate_batch(chunk.iter().map(std::string::String::as_str).collect())
                    .await?;
                all_embeddings.extend(chunk_embeddings);
            }
            all_embeddings
        };

        Ok(fill_empty_positions(
            embeddings,
            &empty_positions,
            self.config.dimension,
        ))
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

/// Re-insert zero vectors for texts rejected during preprocessing.
/// `positions` index the merged output and arrive in ascending order, so
/// each insert lands at its final index.
fn fill_empty_positions(
    mut embeddings: Vec<Vec<f32>>,
    positions: &[usize],
    dimension: usize,
) -> Vec<Vec<f32>> {
    let zero_vector = vec![0.0; dimension];
    for pos in positions {
        embeddings.insert(*pos, zero_vector.clone());
    }
    embeddings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_handling() {
        // This test verifies the position bookkeeping without making API calls
        let texts = ["", "hello", "", "world"];
        let mut filtered = Vec::new();
        let mut empty_pos = Vec::new();

        for (i, t) in texts.iter().enumerate() {
            if t.trim().is_empty() {
                empty_pos.push(i);
            } else {
                filtered.push(*t);
            }
        }

        assert_eq!(filtered, vec!["hello", "world"]);
        assert_eq!(empty_pos, vec![0, 2]);
    }

    #[test]
    fn test_zero_vectors_land_at_their_original_positions() {
        // Empty texts ahead of the only real one
        let merged = fill_empty_positions(vec![vec![0.5, 0.5]], &[0, 1], 2);
        assert_eq!(merged, vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![0.5, 0.5]]);

        // Empty texts past the end of the generated list
        let merged = fill_empty_positions(vec![vec![0.5, 0.5]], &[1, 2], 2);
        assert_eq!(merged, vec![vec![0.5, 0.5], vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_all_empty_batch_yields_zero_vectors() {
        // Preprocessing rejects every text, so the endpoint is never contacted
        let service = EmbeddingService::from_config(EmbeddingConfig {
            provider: EmbeddingProvider::Ollama,
            model: "nomic-embed-text".to_string(),
            dimension: 4,
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
        })
        .unwrap();

        let embeddings = service.generate_batch(vec!["", "   "]).await.unwrap();
        assert_eq!(embeddings, vec![vec![0.0; 4], vec![0.0; 4]]);
    }

    #[test]
    fn test_provider_inference_from_config() {
        let mut app_config = crate::config::AppConfig::default();
        let config = EmbeddingConfig::from_app_config(&app_config);
        assert_eq!(config.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.dimension, 768);

        app_config.embeddings.endpoint = "https://api.openai.com/v1".to_string();
        app_config.embeddings.api_key = "sk-test".to_string();
        let config = EmbeddingConfig::from_app_config(&app_config);
        assert_eq!(config.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }
}
