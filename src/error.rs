//! Error types for Fiesta

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FiestaError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable request. The message is returned verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not configured")]
    MissingApiKey(String),

    #[error("Dispatch failed: {0}")]
    Internal(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl FiestaError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FiestaError>;
