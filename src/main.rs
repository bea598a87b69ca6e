use clap::Parser;
use clap::Subcommand;
use eventrag::config::AppConfig;
use eventrag::database::Database;
use eventrag::models::SearchResult;
use eventrag::routing::RoutingPreferences;
use eventrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "eventrag")]
#[command(about = "EventRAG CLI for query understanding, hybrid event search, and model routing")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a query as retrieval or conversation
    Classify {
        /// The query to classify
        query: String,
    },
    /// Show what the extractor sees in a query
    Analyze {
        /// The query to analyze
        query: String,
        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },
    /// Pick the best downstream model for a query
    Route {
        /// The query to route
        query: String,
        /// Prefer cheap models
        #[arg(long)]
        prioritize_cost: bool,
        /// Prefer fast models
        #[arg(long)]
        prioritize_speed: bool,
        /// Prefer high-reasoning models
        #[arg(long)]
        prioritize_quality: bool,
        /// Hard cap on input cost per 1M tokens
        #[arg(long)]
        max_cost: Option<f64>,
        /// Minimum speed score (0.0 to 1.0)
        #[arg(long)]
        min_speed: Option<f64>,
        /// Print raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },
    /// Run a hybrid search against the event corpus
    Search {
        /// The search query
        query: String,
        /// Result count when the query itself does not ask for one
        #[arg(short, long)]
        top_k: Option<usize>,
        /// Skip the retrieval-vs-conversation gate
        #[arg(long)]
        no_gate: bool,
    },
    /// Initialize the event store schema and indexes
    Init,
    /// Show corpus statistics
    Stats,
    /// Show recent query log entries
    Logs {
        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        eventrag::logging::init_logging_with_level("debug")?;
    } else {
        eventrag::logging::init_logging()?;
    }

    match cli.command {
        Commands::Classify { query } => {
            handle_classify_command(&query);
        }
        Commands::Analyze { query, json } => {
            handle_analyze_command(&query, json)?;
        }
        Commands::Route {
            query,
            prioritize_cost,
            prioritize_speed,
            prioritize_quality,
            max_cost,
            min_speed,
            json,
        } => {
            let preferences = RoutingPreferences {
                prioritize_cost,
                prioritize_speed,
                prioritize_quality,
                max_cost_per_1m: max_cost,
                min_speed,
            };
            handle_route_command(&query, preferences, json)?;
        }
        Commands::Search {
            query,
            top_k,
            no_gate,
        } => {
            handle_search_command(&query, top_k, no_gate).await?;
        }
        Commands::Init => {
            handle_init_command().await?;
        }
        Commands::Stats => {
            handle_stats_command().await?;
        }
        Commands::Logs { limit } => {
            handle_logs_command(limit).await?;
        }
        Commands::Config => {
            handle_config_command()?;
        }
    }

    Ok(())
}

fn handle_classify_command(query: &str) {
    let classification = eventrag::query::classify(query);

    println!("🧭 Classification for: \"{}\"", query);
    println!("  Type: {}", classification.kind);
    println!("  Confidence: {:.2}", classification.confidence);
    println!("  Reason: {}", classification.reason);
}

fn handle_analyze_command(query: &str, json: bool) -> Result<()> {
    let extracted = eventrag::query::extract(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
        return Ok(());
    }

    println!("🔍 Query analysis for: \"{}\"", query);
    println!();
    println!("📦 Entities:");
    println!("  Dates: {:?}", extracted.entities.dates);
    println!("  Emails: {:?}", extracted.entities.emails);
    println!("  Prices: {:?}", extracted.entities.prices);
    println!("  Brands: {:?}", extracted.entities.brands);
    let event_types: Vec<&str> = extracted
        .entities
        .event_types
        .iter()
        .map(|t| t.as_str())
        .collect();
    println!("  Event types: {:?}", event_types);
    println!("  Search terms: {:?}", extracted.entities.search_terms);
    println!();
    let intents: Vec<&str> = extracted.intents.iter().map(|i| i.as_str()).collect();
    println!("🎯 Intents: {:?}", intents);
    match extracted.top_k {
        Some(k) => println!("🔢 Requested count: {}", k),
        None => println!("🔢 Requested count: none (caller default applies)"),
    }

    Ok(())
}

fn handle_route_command(query: &str, preferences: RoutingPreferences, json: bool) -> Result<()> {
    let router = eventrag::routing::ModelRouter::with_builtin_catalog();
    let has_preferences = preferences != RoutingPreferences::default();
    let decision = router.select_model(query, has_preferences.then_some(&preferences));

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!("🧭 Routing for: \"{}\"", query);
    println!();
    println!(
        "🎯 Selected: {} ({} via {})",
        decision.display_name, decision.selected_model, decision.selected_provider
    );
    println!("  Confidence: {:.2}", decision.confidence);
    println!("  Reasoning: {}", decision.reasoning);
    println!();
    println!("📋 Analysis:");
    println!("  Complexity: {}", decision.analysis.complexity);
    println!("  Domain: {}", decision.analysis.domain);
    println!("  Estimated tokens: {}", decision.analysis.estimated_tokens);
    println!();
    println!("🏆 Recommendations:");
    for (i, rec) in decision.recommendations.iter().enumerate() {
        println!(
            "  {}. {} | score {:.1} | est. cost ${:.4}",
            i + 1,
            rec.display_name,
            rec.score,
            rec.estimated_cost
        );
    }

    Ok(())
}

async fn handle_search_command(query: &str, top_k: Option<usize>, no_gate: bool) -> Result<()> {
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    let service = eventrag::rag::RagService::new(&config).await?;
    service.database().verify_schema_or_error().await?;

    if !no_gate && !service.should_use_rag(query).await? {
        let classification = eventrag::query::classify(query);
        println!(
            "💬 This looks like a conversational query ({}), not a corpus search.",
            classification.reason
        );
        println!("   Re-run with --no-gate to search anyway.");
        return Ok(());
    }

    let default_top_k = top_k.unwrap_or_else(|| config.default_top_k());
    println!("🔍 Searching events for: \"{}\"", query);

    match service.process_query(query, default_top_k).await {
        Ok(result) => print_search_result(&result),
        Err(e) => {
            println!("❌ Couldn't process your query: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

fn print_search_result(result: &SearchResult) {
    if result.matches.is_empty() {
        println!("No matches found.");
        return;
    }

    println!(
        "Found {} matches (method: {}, filters: {:?}):",
        result.matches.len(),
        result.method,
        result.filters
    );
    for (i, m) in result.matches.iter().enumerate() {
        let detail = if let Some(price) = m.metadata.price() {
            format!(" | ${:.2}", price)
        } else if let Some(term) = m.metadata.search_term() {
            format!(" | searched \"{}\"", term)
        } else {
            String::new()
        };
        println!(
            "  {}. [{:.3}] {} on {} by {}{}",
            i + 1,
            m.score,
            m.event_type,
            m.event_date,
            m.email,
            detail
        );
    }
}

async fn handle_init_command() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Database::from_config(&config).await?;

    println!("🔧 Initializing event store schema...");
    let lists = config
        .vector_indexes_enabled()
        .then(|| config.vector_index_lists());
    db.init_schema(config.embedding_dimension(), lists).await?;
    println!(
        "✅ Schema ready (vector dimension: {})",
        config.embedding_dimension()
    );

    Ok(())
}

async fn handle_stats_command() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Database::from_config(&config).await?;
    db.verify_schema_or_error().await?;

    let stats = db.event_stats().await?;

    println!("📊 EventRAG Statistics");
    println!("======================");
    println!();
    println!("  Total events: {}", stats.total_events);
    println!("  Purchases: {}", stats.purchases);
    println!("  Pageviews: {}", stats.pageviews);
    println!("  Searches: {}", stats.searches);
    println!("  Distinct emails: {}", stats.distinct_emails);
    match (stats.earliest, stats.latest) {
        (Some(earliest), Some(latest)) => println!("  Date range: {} to {}", earliest, latest),
        _ => println!("  Date range: empty corpus"),
    }

    Ok(())
}

async fn handle_logs_command(limit: i64) -> Result<()> {
    let config = AppConfig::load()?;
    let db = Database::from_config(&config).await?;
    db.verify_schema_or_error().await?;

    let entries = db.recent_query_logs(limit).await?;

    println!("🗒  Recent queries ({} entries):", entries.len());
    for entry in entries {
        println!(
            "  - [{}] \"{}\" | {} results | {}ms | {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.query,
            entry.result_count,
            entry.latency_ms,
            entry.method
        );
    }

    Ok(())
}

fn handle_config_command() -> Result<()> {
    let config = AppConfig::load()?;

    println!("📋 EventRAG Configuration:");
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.log_level());
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Endpoint: {}", config.embedding_endpoint());
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  API key set: {}", !config.embedding_api_key().is_empty());
    println!();

    println!("⚡ Performance:");
    println!("  Vector indexes: {}", config.vector_indexes_enabled());
    println!("  Vector index lists: {}", config.vector_index_lists());
    println!();

    println!("🔍 Retrieval:");
    println!("  Default top_k: {}", config.default_top_k());
    println!("  Query logging: {}", config.query_logging_enabled());

    Ok(())
}

/// Mask database URL for display (hide password)
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            format!(
                "{}://{}@{}:{}{}",
                parsed.scheme(),
                parsed.username(),
                host,
                parsed.port().unwrap_or(5432),
                parsed.path()
            )
        } else {
            "***masked***".to_string()
        }
    } else {
        "***invalid***".to_string()
    }
}
