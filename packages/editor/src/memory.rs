//! # In-Memory Gateway
//!
//! A [`PersistenceGateway`] that keeps everything in process. Used by the
//! tests and by the host binary when no backend is configured.
//!
//! Supports per-operation failure injection and per-document latency so the
//! failure and reordering paths can be exercised deterministically.

use crate::errors::GatewayError;
use crate::gateway::{AuthSession, ContentWrite, DocumentMetadata, PersistenceGateway, StoredContent};
use crate::tree::DocumentTree;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use songframe_protocol::DocumentId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Gateway calls, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentSession,
    SetSession,
    DocumentMetadata,
    DocumentContent,
    UpsertContent,
    UpdateTitle,
}

/// Seed data, e.g. read from a JSON file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    #[serde(default)]
    pub documents: Vec<FixtureDocument>,

    /// Accepted access token → user id
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDocument {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<DocumentTree>,
}

#[derive(Debug, Default)]
struct MemoryState {
    titles: HashMap<DocumentId, Option<String>>,
    contents: HashMap<DocumentId, StoredContent>,
    tokens: HashMap<String, String>,
    session: Option<AuthSession>,
    failures: HashMap<Operation, String>,
    attempts: HashMap<Operation, usize>,
    latency: HashMap<DocumentId, Duration>,
    writes: Vec<ContentWrite>,
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let mut gateway = Self::new();
        for document in fixtures.documents {
            let Some(id) = seed_id(&document.id) else {
                continue;
            };
            let state = gateway.state_mut();
            state.titles.insert(id.clone(), document.title);
            if let Some(content) = document.content {
                state.contents.insert(
                    id,
                    StoredContent {
                        content: Some(content),
                        updated_at: None,
                    },
                );
            }
        }
        gateway.state_mut().tokens.extend(fixtures.tokens);
        gateway
    }

    pub fn with_document(mut self, id: &str, title: &str) -> Self {
        if let Some(id) = seed_id(id) {
            self.state_mut().titles.insert(id, Some(title.to_string()));
        }
        self
    }

    pub fn with_untitled_document(mut self, id: &str) -> Self {
        if let Some(id) = seed_id(id) {
            self.state_mut().titles.insert(id, None);
        }
        self
    }

    pub fn with_content(mut self, id: &str, content: StoredContent) -> Self {
        if let Some(id) = seed_id(id) {
            self.state_mut().contents.insert(id, content);
        }
        self
    }

    /// Accept `token` as `user_id`
    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.state_mut()
            .tokens
            .insert(token.to_string(), user_id.to_string());
        self
    }

    /// Delay metadata and content fetches for `id`
    pub fn with_latency(mut self, id: &str, latency: Duration) -> Self {
        if let Some(id) = seed_id(id) {
            self.state_mut().latency.insert(id, latency);
        }
        self
    }

    /// Make every call to `operation` fail with `message` until cleared
    pub fn fail(&self, operation: Operation, message: &str) {
        self.state().failures.insert(operation, message.to_string());
    }

    pub fn clear_failure(&self, operation: Operation) {
        self.state().failures.remove(&operation);
    }

    /// Successful content writes, oldest first
    pub fn writes(&self) -> Vec<ContentWrite> {
        self.state().writes.clone()
    }

    pub fn attempts(&self, operation: Operation) -> usize {
        self.state().attempts.get(&operation).copied().unwrap_or(0)
    }

    pub fn stored_content(&self, id: &DocumentId) -> Option<StoredContent> {
        self.state().contents.get(id).cloned()
    }

    pub fn title(&self, id: &DocumentId) -> Option<String> {
        self.state().titles.get(id).cloned().flatten()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, operation: Operation) -> Result<(), GatewayError> {
        let mut state = self.state();
        *state.attempts.entry(operation).or_default() += 1;
        match state.failures.get(&operation) {
            Some(message) => Err(GatewayError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn delay(&self, id: &DocumentId) {
        let latency = self.state().latency.get(id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn seed_id(id: &str) -> Option<DocumentId> {
    let parsed = DocumentId::parse(id);
    if parsed.is_none() {
        tracing::warn!("[MemoryGateway] ignoring seed data with blank document id");
    }
    parsed
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>, GatewayError> {
        self.begin(Operation::CurrentSession)?;
        Ok(self.state().session.clone())
    }

    async fn set_session(&self, token: &str) -> Result<AuthSession, GatewayError> {
        self.begin(Operation::SetSession)?;
        let mut state = self.state();
        let user_id = state
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| GatewayError::new("Invalid token"))?;

        let session = AuthSession {
            user_id,
            access_token: token.to_string(),
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn document_metadata(&self, id: &DocumentId) -> Result<DocumentMetadata, GatewayError> {
        self.delay(id).await;
        self.begin(Operation::DocumentMetadata)?;
        match self.state().titles.get(id) {
            Some(title) => Ok(DocumentMetadata {
                title: title.clone(),
            }),
            None => Err(GatewayError::new(format!("Document not found: {}", id))),
        }
    }

    async fn document_content(&self, id: &DocumentId) -> Result<Option<StoredContent>, GatewayError> {
        self.delay(id).await;
        self.begin(Operation::DocumentContent)?;
        Ok(self.state().contents.get(id).cloned())
    }

    async fn upsert_content(&self, write: ContentWrite) -> Result<(), GatewayError> {
        self.begin(Operation::UpsertContent)?;
        let mut state = self.state();
        state.contents.insert(
            write.document_id.clone(),
            StoredContent {
                content: Some(write.content.clone()),
                updated_at: Some(Utc::now()),
            },
        );
        state.writes.push(write);
        Ok(())
    }

    async fn update_title(&self, id: &DocumentId, title: &str) -> Result<(), GatewayError> {
        self.begin(Operation::UpdateTitle)?;
        // Matches a filtered UPDATE: no row, no error
        if let Some(existing) = self.state().titles.get_mut(id) {
            *existing = Some(title.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> DocumentId {
        DocumentId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_metadata_lookup() {
        let gateway = MemoryGateway::new().with_document("doc1", "Song");
        let metadata = gateway.document_metadata(&id("doc1")).await.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Song"));

        let missing = gateway.document_metadata(&id("nope")).await;
        assert_eq!(missing, Err(GatewayError::new("Document not found: nope")));
    }

    #[tokio::test]
    async fn test_content_absent_until_upserted() {
        let gateway = MemoryGateway::new().with_document("doc1", "Song");
        assert_eq!(gateway.document_content(&id("doc1")).await.unwrap(), None);

        gateway
            .upsert_content(ContentWrite {
                document_id: id("doc1"),
                content: json!({ "type": "doc" }),
                updated_by: None,
            })
            .await
            .unwrap();

        let stored = gateway.document_content(&id("doc1")).await.unwrap().unwrap();
        assert_eq!(stored.content, Some(json!({ "type": "doc" })));
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let gateway = MemoryGateway::new();
        for text in ["a", "b"] {
            gateway
                .upsert_content(ContentWrite {
                    document_id: id("doc1"),
                    content: json!({ "text": text }),
                    updated_by: Some("u".to_string()),
                })
                .await
                .unwrap();
        }
        let stored = gateway.stored_content(&id("doc1")).unwrap();
        assert_eq!(stored.content, Some(json!({ "text": "b" })));
        assert_eq!(gateway.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_tokens_and_session() {
        let gateway = MemoryGateway::new().with_token("t1", "user-1");
        assert_eq!(gateway.current_session().await.unwrap(), None);

        assert!(gateway.set_session("bad").await.is_err());
        let session = gateway.set_session("t1").await.unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_eq!(gateway.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let gateway = MemoryGateway::new().with_document("doc1", "Song");
        gateway.fail(Operation::UpdateTitle, "row level security");

        let result = gateway.update_title(&id("doc1"), "New").await;
        assert_eq!(result, Err(GatewayError::new("row level security")));
        assert_eq!(gateway.title(&id("doc1")).as_deref(), Some("Song"));

        gateway.clear_failure(Operation::UpdateTitle);
        gateway.update_title(&id("doc1"), "New").await.unwrap();
        assert_eq!(gateway.title(&id("doc1")).as_deref(), Some("New"));
        assert_eq!(gateway.attempts(Operation::UpdateTitle), 2);
    }

    #[test]
    fn test_from_fixtures() {
        let fixtures: Fixtures = serde_json::from_value(json!({
            "documents": [
                { "id": "doc1", "title": "Song", "content": { "type": "doc", "content": [] } },
                { "id": "doc2" },
                { "id": " " }
            ],
            "tokens": { "t1": "user-1" }
        }))
        .unwrap();

        let gateway = MemoryGateway::from_fixtures(fixtures);
        assert_eq!(gateway.title(&id("doc1")).as_deref(), Some("Song"));
        assert!(gateway.stored_content(&id("doc1")).is_some());
        assert_eq!(gateway.title(&id("doc2")), None);
        assert!(gateway.stored_content(&id("doc2")).is_none());
    }
}
