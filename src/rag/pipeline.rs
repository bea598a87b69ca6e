//! Complete hybrid search pipeline: Extract -> Retrieve -> Re-rank -> Redact

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::database::Database;
use crate::database::EventFilters;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::EventType;
use crate::models::QueryLogEntry;
use crate::models::SearchResult;
use crate::query;
use crate::rag::privacy;
use crate::rag::rerank;
use crate::rag::Retriever;

/// Over-fetch multiplier applied before re-ranking
const CANDIDATE_FACTOR: usize = 2;

/// Complete hybrid search service
pub struct RagService {
    database: Arc<Database>,
    retriever: Retriever,
    log_queries: bool,
}

impl RagService {
    /// Create a new search service
    ///
    /// # Errors
    /// - Database connection errors
    /// - Embedding service configuration errors (invalid API keys, endpoints)
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embedding_service = Arc::new(EmbeddingService::new(config)?);

        Ok(Self::from_services(
            database,
            embedding_service,
            config.query_logging_enabled(),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        database: Arc<Database>,
        embedding_service: Arc<EmbeddingService>,
        log_queries: bool,
    ) -> Self {
        let retriever = Retriever::new(Arc::clone(&database), embedding_service);

        Self {
            database,
            retriever,
            log_queries,
        }
    }

    /// Perform a complete hybrid search for a free-text query
    ///
    /// `default_top_k` applies only when the query itself does not ask for a
    /// count ("top 3 purchases" wins over the default).
    ///
    /// # Errors
    /// - Embedding generation failures (the query cannot be vectorized)
    /// - Database query failures
    ///
    /// Zero matches are not an error; they return an empty result set.
    pub async fn process_query(
        &self,
        query_text: &str,
        default_top_k: usize,
    ) -> Result<SearchResult> {
        info!("Processing search query: {}", query_text);
        let started = Instant::now();

        // Step 1: Extract entities and intents
        debug!("Step 1: Extracting query structure");
        let extracted = query::extract(query_text);
        debug!("Detected intents: {:?}", extracted.intents);

        // Step 2: Resolve the requested result count
        let final_top_k = extracted.top_k.unwrap_or(default_top_k);
        debug!("Step 2: Resolved top_k = {}", final_top_k);

        // Step 3: Sharpen event-type filters from query vocabulary
        let mut entities = extracted.entities;
        if query::mentions_search(query_text) && !entities.event_types.contains(&EventType::Search)
        {
            entities.event_types.push(EventType::Search);
        }
        if query::mentions_purchase(query_text)
            && !entities.event_types.contains(&EventType::Purchase)
        {
            entities.event_types.push(EventType::Purchase);
        }

        // Steps 4-5: Embed and run the filtered store query, over-fetching
        // so the re-ranker has candidates to demote
        debug!("Step 3: Retrieving candidates");
        let filters = EventFilters::from_entities(&entities);
        let fetch_limit = (final_top_k * CANDIDATE_FACTOR) as i64;
        let candidates = self
            .retriever
            .retrieve(query_text, &filters, fetch_limit)
            .await?;
        debug!("Retrieved {} candidates", candidates.len());

        // Step 6: Re-rank on price intent and verbatim search terms
        debug!("Step 4: Re-ranking candidates");
        let mut matches = rerank::rerank(query_text, candidates, final_top_k);

        // Step 7: Scramble emails before anything leaves the pipeline
        for item in &mut matches {
            item.email = privacy::scramble_email(&item.email);
        }

        let result = SearchResult::new(matches, entities.non_empty_categories(), final_top_k);
        let latency_ms = started.elapsed().as_millis() as i64;
        info!(
            "Search completed: {} matches in {}ms",
            result.matches.len(),
            latency_ms
        );

        // Step 8: Best-effort query log; a sink failure never fails the search
        if self.log_queries {
            let entry =
                QueryLogEntry::new(query_text, result.matches.len(), latency_ms, &result.method);
            if let Err(e) = self.database.insert_query_log(&entry).await {
                warn!("Failed to record query log: {}", e);
            }
        }

        Ok(result)
    }

    /// Decide whether a query should hit the corpus at all. An empty corpus
    /// always routes to general handling regardless of query shape.
    ///
    /// # Errors
    /// - Database query failures while probing for data
    pub async fn should_use_rag(&self, query_text: &str) -> Result<bool> {
        let has_data = self.database.has_events().await?;
        Ok(query::should_use_rag(query_text, has_data))
    }

    /// Get database reference
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Get retriever reference
    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}
