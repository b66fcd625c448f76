//! Error types for the editor

use thiserror::Error;

/// Failure reported by a persistence collaborator
///
/// Carries the backend's message verbatim; it ends up in the host's ERROR event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every failure the editor surfaces to the host
///
/// None of these are fatal. `Display` is the exact host-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Token rejected
    #[error("{0}")]
    Auth(String),

    /// Metadata or content fetch failed
    #[error("{0}")]
    Load(String),

    /// Upsert failed
    #[error("{0}")]
    Save(String),

    /// Title update failed
    #[error("{0}")]
    Rename(String),
}

impl EditorError {
    pub fn auth(e: GatewayError) -> Self {
        EditorError::Auth(e.message)
    }

    pub fn load(e: GatewayError) -> Self {
        EditorError::Load(e.message)
    }

    pub fn save(e: GatewayError) -> Self {
        EditorError::Save(e.message)
    }

    pub fn rename(e: GatewayError) -> Self {
        EditorError::Rename(e.message)
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            EditorError::Auth(_) => "auth",
            EditorError::Load(_) => "load",
            EditorError::Save(_) => "save",
            EditorError::Rename(_) => "rename",
        }
    }
}
