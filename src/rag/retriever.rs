//! Candidate retrieval: embed the query, run the filtered store search

use std::sync::Arc;

use tracing::debug;

use crate::database::Database;
use crate::database::EventFilters;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::RecordMetadata;
use crate::models::SearchMatch;

/// Retriever over the event corpus
pub struct Retriever {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(database: Arc<Database>, embedding_service: Arc<EmbeddingService>) -> Self {
        Self {
            database,
            embedding_service,
        }
    }

    /// Fetch up to `limit` scored candidates for a query under the given
    /// filters. Embedding generation is the one fatal step; a store failure
    /// propagates as well rather than masquerading as an empty result.
    pub async fn retrieve(
        &self,
        query: &str,
        filters: &EventFilters,
        limit: i64,
    ) -> Result<Vec<SearchMatch>> {
        debug!("Generating query embedding");
        let query_embedding = self.embedding_service.generate(query).await?;

        debug!("Running filtered similarity search, limit={}", limit);
        let scored = self
            .database
            .similarity_search_events(query_embedding, filters, limit)
            .await?;

        let matches = scored
            .into_iter()
            .map(|event| SearchMatch {
                id: event.id,
                score: event.score,
                event_type: event.event_type,
                event_date: event.event_date,
                email: event.email,
                metadata: RecordMetadata::from_value(&event.metadata),
            })
            .collect();

        Ok(matches)
    }
}
