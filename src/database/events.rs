use chrono::NaiveDate;
use uuid::Uuid;

use super::Database;
use crate::models::EventStats;
use crate::models::EventType;
use crate::models::QueryLogEntry;
use crate::models::QueryLogRecord;
use crate::query::QueryEntities;
use crate::Result;

/// Store-level filters derived from extracted entities.
///
/// Categories combine with AND; values within a category with `ANY`. An
/// empty category places no constraint at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilters {
    pub event_types: Option<Vec<String>>,
    pub dates: Option<Vec<NaiveDate>>,
    pub emails: Option<Vec<String>>,
}

impl EventFilters {
    /// Build filters from extracted entities; unparseable date strings are
    /// dropped rather than failing the query
    pub fn from_entities(entities: &QueryEntities) -> Self {
        let event_types = if entities.event_types.is_empty() {
            None
        } else {
            Some(
                entities
                    .event_types
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            )
        };

        let dates: Vec<NaiveDate> = entities
            .dates
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .collect();
        let dates = if dates.is_empty() { None } else { Some(dates) };

        let emails = if entities.emails.is_empty() {
            None
        } else {
            Some(entities.emails.clone())
        };

        Self {
            event_types,
            dates,
            emails,
        }
    }
}

/// One candidate row from the similarity query, scored by cosine similarity
#[derive(Debug, Clone)]
pub struct ScoredEvent {
    pub id: Uuid,
    pub score: f32,
    pub event_type: EventType,
    pub event_date: NaiveDate,
    pub email: String,
    pub metadata: serde_json::Value,
}

impl Database {
    /// Nearest-neighbor search over the event corpus with conjunctive
    /// metadata filters. Rows come back closest first; the score is
    /// `1 - cosine_distance`.
    pub async fn similarity_search_events(
        &self,
        query_embedding: Vec<f32>,
        filters: &EventFilters,
        limit: i64,
    ) -> Result<Vec<ScoredEvent>> {
        #[derive(sqlx::FromRow)]
        struct RawResult {
            id: Uuid,
            event_type: String,
            event_date: NaiveDate,
            email: String,
            metadata: serde_json::Value,
            similarity: f64, // PostgreSQL returns FLOAT8 (f64) from distance operator
        }

        let raw_results = sqlx::query_as::<_, RawResult>(
            r"
            SELECT
                id,
                event_type,
                event_date,
                email,
                metadata,
                1 - (embedding <=> $1::vector) as similarity
            FROM events
            WHERE ($2::text[] IS NULL OR event_type = ANY($2))
              AND ($3::date[] IS NULL OR event_date = ANY($3))
              AND ($4::text[] IS NULL OR email = ANY($4))
            ORDER BY embedding <=> $1::vector
            LIMIT $5
            ",
        )
        .bind(pgvector::Vector::from(query_embedding))
        .bind(&filters.event_types)
        .bind(&filters.dates)
        .bind(&filters.emails)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let results = raw_results
            .into_iter()
            .map(|r| ScoredEvent {
                id: r.id,
                score: r.similarity as f32, // Convert f64 to f32
                event_type: EventType::from(r.event_type.as_str()),
                event_date: r.event_date,
                email: r.email,
                metadata: r.metadata,
            })
            .collect();

        Ok(results)
    }

    /// True once at least one event row has been ingested
    pub async fn has_events(&self) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM events)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Aggregate counts over the event corpus
    pub async fn event_stats(&self) -> Result<EventStats> {
        let stats = sqlx::query_as::<_, EventStats>(
            r"
            SELECT
                COUNT(*) as total_events,
                COUNT(*) FILTER (WHERE event_type = 'purchase') as purchases,
                COUNT(*) FILTER (WHERE event_type = 'pageview') as pageviews,
                COUNT(*) FILTER (WHERE event_type = 'search') as searches,
                COUNT(DISTINCT email) as distinct_emails,
                MIN(event_date) as earliest,
                MAX(event_date) as latest
            FROM events
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Append one row to the query log
    pub async fn insert_query_log(&self, entry: &QueryLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO query_logs (query, result_count, latency_ms, method) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&entry.query)
        .bind(entry.result_count)
        .bind(entry.latency_ms)
        .bind(&entry.method)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent query-log rows, newest first
    pub async fn recent_query_logs(&self, limit: i64) -> Result<Vec<QueryLogRecord>> {
        let logs = sqlx::query_as::<_, QueryLogRecord>(
            "SELECT id, query, result_count, latency_ms, method, created_at \
             FROM query_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_from_empty_entities_are_unconstrained() {
        let filters = EventFilters::from_entities(&QueryEntities::default());
        assert_eq!(filters, EventFilters::default());
        assert!(filters.event_types.is_none());
        assert!(filters.dates.is_none());
        assert!(filters.emails.is_none());
    }

    #[test]
    fn test_filters_bind_every_non_empty_category() {
        let entities = QueryEntities {
            dates: vec!["2024-01-15".to_string()],
            emails: vec!["bob@example.com".to_string()],
            event_types: vec![EventType::Purchase, EventType::Search],
            ..Default::default()
        };

        let filters = EventFilters::from_entities(&entities);
        assert_eq!(
            filters.event_types,
            Some(vec!["purchase".to_string(), "search".to_string()])
        );
        assert_eq!(
            filters.dates,
            Some(vec![NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()])
        );
        assert_eq!(filters.emails, Some(vec!["bob@example.com".to_string()]));
    }

    #[test]
    fn test_filters_drop_unparseable_dates() {
        let entities = QueryEntities {
            dates: vec!["2024-99-99".to_string(), "2024-02-01".to_string()],
            ..Default::default()
        };

        let filters = EventFilters::from_entities(&entities);
        assert_eq!(
            filters.dates,
            Some(vec![NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()])
        );
    }

    #[test]
    fn test_filters_all_invalid_dates_mean_no_date_constraint() {
        let entities = QueryEntities {
            dates: vec!["2024-13-40".to_string()],
            ..Default::default()
        };

        let filters = EventFilters::from_entities(&entities);
        assert!(filters.dates.is_none());
    }
}
