//! # Persistence Gateway
//!
//! The remote store holding document metadata, document content and the
//! auth session. The editor only ever talks to it through this trait.
//!
//! Every call is a suspension point: while one is in flight the editor keeps
//! processing host commands and edits, so callers compare the context they
//! captured with current state once the call returns.

use crate::errors::GatewayError;
use crate::tree::DocumentTree;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use songframe_protocol::DocumentId;

/// An authenticated backend session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
}

/// Persisted content row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredContent {
    pub content: Option<DocumentTree>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert-or-overwrite keyed by document id
#[derive(Debug, Clone, PartialEq)]
pub struct ContentWrite {
    pub document_id: DocumentId,
    pub content: DocumentTree,
    pub updated_by: Option<String>,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// The active session, if any
    async fn current_session(&self) -> Result<Option<AuthSession>, GatewayError>;

    /// Establish a session from a host-supplied access token
    async fn set_session(&self, token: &str) -> Result<AuthSession, GatewayError>;

    /// Fails when the document does not exist
    async fn document_metadata(&self, id: &DocumentId) -> Result<DocumentMetadata, GatewayError>;

    /// `Ok(None)` for a document that has never been saved
    async fn document_content(&self, id: &DocumentId) -> Result<Option<StoredContent>, GatewayError>;

    async fn upsert_content(&self, write: ContentWrite) -> Result<(), GatewayError>;

    async fn update_title(&self, id: &DocumentId, title: &str) -> Result<(), GatewayError>;
}
