use std::net::SocketAddr;

use thiserror::Error;

/// Errors from the remote command server.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Failed to bind to address
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error (line too long, invalid UTF-8)
    #[error("Codec error: {0}")]
    Codec(String),

    /// Malformed request body
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
