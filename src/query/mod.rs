//! Query understanding: entity extraction, intent tagging, and
//! retrieval-vs-conversation classification

pub mod classifier;
pub mod entities;

pub use classifier::classify;
pub use classifier::should_use_rag;
pub use classifier::QueryClassification;
pub use classifier::QueryKind;
pub use entities::detect_intents;
pub use entities::extract;
pub use entities::extract_at;
pub use entities::extract_entities;
pub use entities::extract_entities_at;
pub use entities::extract_top_k;
pub use entities::infer_event_types;
pub use entities::mentions_pageview;
pub use entities::mentions_purchase;
pub use entities::mentions_search;
pub use entities::ExtractedQuery;
pub use entities::QueryEntities;
pub use entities::QueryIntent;
