pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod logging;
pub mod models;
pub mod query;
pub mod rag;
pub mod routing;

pub use config::AppConfig;
pub use errors::*;
