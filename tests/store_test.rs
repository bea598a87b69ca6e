//! Live event-store tests against a configured PostgreSQL instance with the
//! pgvector extension. Run with `cargo test -- --ignored` once `config.toml`
//! points at a reachable database.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use eventrag::database::Database;
use eventrag::database::EventFilters;
use eventrag::embeddings::EmbeddingService;
use eventrag::models::EventType;
use eventrag::models::QueryLogEntry;
use eventrag::models::MAX_LOGGED_QUERY_CHARS;
use eventrag::rag::RagService;
use eventrag::AppConfig;
use eventrag::Result;

async fn setup() -> Result<(Database, usize)> {
    let config = AppConfig::load()?;
    let dimension = config.embedding_dimension();
    let db = Database::from_config(&config).await?;
    db.init_schema(dimension, None).await?;
    Ok((db, dimension))
}

/// Unit vector along one axis; orthogonal axes have cosine similarity zero
fn basis_vector(dimension: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[axis % dimension] = 1.0;
    v
}

async fn seed_event(
    db: &Database,
    embedding: Vec<f32>,
    event_type: &str,
    event_date: NaiveDate,
    email: &str,
    metadata: serde_json::Value,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO events (embedding, metadata, event_date, event_type, email) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(pgvector::Vector::from(embedding))
    .bind(metadata)
    .bind(event_date)
    .bind(event_type)
    .bind(email)
    .execute(db.pool())
    .await?;
    Ok(())
}

/// Each test owns one fixture email domain so parallel tests never delete
/// each other's rows
async fn clear_rows(db: &Database, email_domain: &str) -> Result<()> {
    sqlx::query("DELETE FROM events WHERE email LIKE $1")
        .bind(format!("%@{email_domain}"))
        .execute(db.pool())
        .await?;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_schema_bootstrap_is_idempotent() -> Result<()> {
    let (db, dimension) = setup().await?;

    // A second run over an existing schema must be a no-op
    db.init_schema(dimension, None).await?;
    assert!(db.is_schema_initialized().await?);
    db.verify_schema_or_error().await?;

    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_similarity_search_orders_by_cosine_distance() -> Result<()> {
    let (db, dimension) = setup().await?;
    clear_rows(&db, "order.fixture.test").await?;

    let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    seed_event(
        &db,
        basis_vector(dimension, 0),
        "purchase",
        date,
        "near@order.fixture.test",
        json!({ "eventType": "purchase", "price": 25.0 }),
    )
    .await?;
    seed_event(
        &db,
        basis_vector(dimension, 1),
        "purchase",
        date,
        "far@order.fixture.test",
        json!({ "eventType": "purchase", "price": 75.0 }),
    )
    .await?;

    let filters = EventFilters {
        emails: Some(vec![
            "near@order.fixture.test".to_string(),
            "far@order.fixture.test".to_string(),
        ]),
        ..Default::default()
    };
    let results = db
        .similarity_search_events(basis_vector(dimension, 0), &filters, 10)
        .await?;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].email, "near@order.fixture.test");
    assert!(results[0].score > 0.99);
    assert_eq!(results[1].email, "far@order.fixture.test");
    assert!(results[1].score < 0.01);

    clear_rows(&db, "order.fixture.test").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_filters_combine_conjunctively() -> Result<()> {
    let (db, dimension) = setup().await?;
    clear_rows(&db, "conj.fixture.test").await?;

    let day_one = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    let rows = [
        ("purchase", "alice@conj.fixture.test", day_one),
        ("search", "alice@conj.fixture.test", day_one),
        ("purchase", "bob@conj.fixture.test", day_two),
        ("search", "bob@conj.fixture.test", day_two),
    ];
    for (event_type, email, date) in rows {
        seed_event(
            &db,
            basis_vector(dimension, 0),
            event_type,
            date,
            email,
            json!({ "eventType": event_type }),
        )
        .await?;
    }

    let scope = vec![
        "alice@conj.fixture.test".to_string(),
        "bob@conj.fixture.test".to_string(),
    ];

    // One category: values within it combine with ANY
    let filters = EventFilters {
        emails: Some(scope.clone()),
        ..Default::default()
    };
    let results = db
        .similarity_search_events(basis_vector(dimension, 0), &filters, 10)
        .await?;
    assert_eq!(results.len(), 4);

    // Adding a category narrows with AND
    let filters = EventFilters {
        event_types: Some(vec!["purchase".to_string()]),
        emails: Some(scope.clone()),
        ..Default::default()
    };
    let results = db
        .similarity_search_events(basis_vector(dimension, 0), &filters, 10)
        .await?;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.event_type == EventType::Purchase));

    // All three categories at once pin a single row
    let filters = EventFilters {
        event_types: Some(vec!["purchase".to_string()]),
        dates: Some(vec![day_one]),
        emails: Some(scope),
    };
    let results = db
        .similarity_search_events(basis_vector(dimension, 0), &filters, 10)
        .await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].email, "alice@conj.fixture.test");
    assert_eq!(results[0].event_date, day_one);

    clear_rows(&db, "conj.fixture.test").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_unmatched_filters_yield_empty_not_error() -> Result<()> {
    let (db, dimension) = setup().await?;

    let filters = EventFilters {
        emails: Some(vec!["nobody@void.fixture.test".to_string()]),
        ..Default::default()
    };
    let results = db
        .similarity_search_events(basis_vector(dimension, 0), &filters, 10)
        .await?;
    assert!(results.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_query_log_round_trip() -> Result<()> {
    let (db, _) = setup().await?;

    let marker = format!("log round trip {}", Uuid::new_v4());
    let entry = QueryLogEntry::new(&marker, 4, 123, "hybrid-search");
    db.insert_query_log(&entry).await?;

    let logs = db.recent_query_logs(50).await?;
    let found = logs
        .iter()
        .find(|l| l.query == marker)
        .expect("inserted log row should be among the most recent");
    assert_eq!(found.result_count, 4);
    assert_eq!(found.latency_ms, 123);
    assert_eq!(found.method, "hybrid-search");

    // Overlong queries are truncated before they reach the store
    let prefix = Uuid::new_v4().to_string();
    let long_marker = format!("{prefix} {}", "x".repeat(600));
    db.insert_query_log(&QueryLogEntry::new(&long_marker, 0, 1, "hybrid-search"))
        .await?;
    let logs = db.recent_query_logs(50).await?;
    let truncated = logs
        .iter()
        .find(|l| l.query.starts_with(&prefix))
        .expect("truncated log row should be among the most recent");
    assert_eq!(truncated.query.chars().count(), MAX_LOGGED_QUERY_CHARS);

    Ok(())
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_event_stats_track_seeded_rows() -> Result<()> {
    let (db, dimension) = setup().await?;
    clear_rows(&db, "stats.fixture.test").await?;

    let before = db.event_stats().await?;
    seed_event(
        &db,
        basis_vector(dimension, 2),
        "purchase",
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
        "counted@stats.fixture.test",
        json!({ "eventType": "purchase", "price": 10.0 }),
    )
    .await?;

    let after = db.event_stats().await?;
    // Other tests may insert concurrently, so bounds rather than equality
    assert!(after.total_events >= before.total_events + 1);
    assert!(after.purchases >= before.purchases + 1);
    assert!(after.earliest.is_some());
    assert!(after.latest.is_some());
    assert!(db.has_events().await?);

    clear_rows(&db, "stats.fixture.test").await?;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires database and embedding endpoint"]
async fn test_hybrid_pipeline_end_to_end() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Arc::new(Database::from_config(&config).await?);
    db.init_schema(config.embedding_dimension(), None).await?;
    clear_rows(&db, "e2e.fixture.test").await?;

    let embeddings = Arc::new(EmbeddingService::new(&config)?);
    let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    let purchases = [
        (1200.0, "amber.woods@e2e.fixture.test"),
        (80.0, "brian.oh@e2e.fixture.test"),
        (450.0, "carla.diaz@e2e.fixture.test"),
    ];
    for (price, email) in purchases {
        let text = format!("purchase of running shoes for ${price}");
        let vector = embeddings.generate(&text).await?;
        seed_event(
            &db,
            vector,
            "purchase",
            date,
            email,
            json!({ "eventType": "purchase", "price": price, "brands": ["nike"] }),
        )
        .await?;
    }

    let service = RagService::from_services(Arc::clone(&db), embeddings, false);
    let result = service
        .process_query("top 2 most expensive purchases", 5)
        .await?;

    assert_eq!(result.requested_top_k, 2);
    assert_eq!(result.method, "hybrid-search");
    assert!(result.filters.contains(&"event_types".to_string()));
    assert!(!result.matches.is_empty());
    assert!(result.matches.len() <= 2);
    for m in &result.matches {
        assert_eq!(m.event_type, EventType::Purchase);
        assert!(m.email.contains("***"));
        assert!((0.0..=1.0).contains(&m.score));
    }

    clear_rows(&db, "e2e.fixture.test").await?;
    Ok(())
}
