use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EventRagError>;
