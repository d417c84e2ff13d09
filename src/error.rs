use thiserror::Error;

/// Library errors using thiserror for structured error handling.
///
/// Only `LoadError` crosses the sound manager's boundary as a failure;
/// transient platform errors (`GraphError`) are caught and discarded at the
/// point of call so the scene degrades to silence instead of breaking.

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read sound file: {path}")]
    Fetch {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode sound data for '{name}'")]
    Decode {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Audio platform unavailable")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to open audio output stream")]
    OutputUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unsupported or corrupt audio payload")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Graph transport call rejected: {0}")]
    Transport(String),

    #[error("Graph is closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
