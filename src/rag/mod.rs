//! Retrieval module
//!
//! This module provides end-to-end hybrid search over the event corpus:
//! - Semantic retrieval using vector embeddings with structured filters
//! - Intent-aware re-ranking (price direction, verbatim search terms)
//! - Email scrambling on every result that leaves the pipeline
//!
//! # Examples
//!
//! ```rust,no_run
//! use eventrag::rag::RagService;
//! use eventrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config).await?;
//!
//!     let result = service.process_query("top 5 purchases last week", 5).await?;
//!     println!("Found {} matches via {}", result.matches.len(), result.method);
//!
//!     Ok(())
//! }
//! ```

pub mod pipeline;
pub mod privacy;
pub mod rerank;
pub mod retriever;

pub use pipeline::RagService;
pub use privacy::scramble_email;
pub use rerank::rerank;
pub use retriever::Retriever;
