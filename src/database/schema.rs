use super::Database;
use crate::EventRagError;
use crate::Result;

impl Database {
    /// Check if database schema is initialized
    /// Returns true if all required tables exist
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let required_tables = vec!["events", "query_logs"];

        for table_name in required_tables {
            let result = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !result {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(EventRagError::Config(
                "Database schema not initialized. Run `eventrag init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize the event store schema.
    ///
    /// `dimension` fixes the vector column width; `vector_index_lists`
    /// enables an ivfflat index when set.
    pub async fn init_schema(
        &self,
        dimension: usize,
        vector_index_lists: Option<usize>,
    ) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                embedding VECTOR({dimension}) NOT NULL,
                metadata JSONB NOT NULL,
                event_date DATE NOT NULL,
                event_type TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS query_logs (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                query TEXT NOT NULL,
                result_count INTEGER NOT NULL,
                latency_ms BIGINT NOT NULL,
                method TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        self.create_indexes(vector_index_lists).await?;

        Ok(())
    }

    async fn create_indexes(&self, vector_index_lists: Option<usize>) -> Result<()> {
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_event_date ON events(event_date)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_email ON events(email)")
            .execute(&self.pool)
            .await?;

        if let Some(lists) = vector_index_lists {
            // ivfflat build can fail on an empty table or an old pgvector;
            // sequential scan still works without it
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_events_embedding ON events \
                 USING ivfflat (embedding vector_cosine_ops) WITH (lists = {lists})"
            ))
            .execute(&self.pool)
            .await
            .ok();
        }

        tracing::debug!("Essential indexes ensured");
        Ok(())
    }
}
