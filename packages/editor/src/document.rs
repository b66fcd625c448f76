//! # Document Record
//!
//! In-memory copy of the open document. It is loaded wholesale whenever the
//! session's document changes and replaced, never merged, by the next load.
//!
//! ## Lifecycle
//!
//! ```text
//! OPEN_DOC → metadata + content → DocumentRecord → edits → upsert
//!                                      ↑                     │
//!                                      └──── lastSavedAt ────┘
//! ```

use crate::gateway::{DocumentMetadata, StoredContent};
use crate::tree::DocumentTree;
use chrono::{DateTime, Utc};
use songframe_protocol::DocumentId;

/// Title used when the backend has none
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,

    /// `None` for a document that has never been saved
    pub content: Option<DocumentTree>,

    pub last_saved_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Assemble a record from the two halves of a load
    ///
    /// Blank titles fall back to `untitled`; a stored row with a null tree
    /// counts as no content.
    pub fn assemble(
        id: DocumentId,
        metadata: DocumentMetadata,
        stored: Option<StoredContent>,
        untitled: &str,
    ) -> Self {
        let title = metadata
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| untitled.to_string());

        let (content, last_saved_at) = match stored {
            Some(stored) => (stored.content.filter(|tree| !tree.is_null()), stored.updated_at),
            None => (None, None),
        };

        Self {
            id,
            title,
            content,
            last_saved_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> DocumentId {
        DocumentId::parse("doc1").unwrap()
    }

    #[test]
    fn test_assemble_full_record() {
        let saved = Utc::now();
        let record = DocumentRecord::assemble(
            id(),
            DocumentMetadata {
                title: Some("Road Song".to_string()),
            },
            Some(StoredContent {
                content: Some(json!({ "type": "doc", "content": [] })),
                updated_at: Some(saved),
            }),
            UNTITLED,
        );

        assert_eq!(record.title, "Road Song");
        assert!(record.content.is_some());
        assert_eq!(record.last_saved_at, Some(saved));
    }

    #[test]
    fn test_missing_title_and_content() {
        let record = DocumentRecord::assemble(
            id(),
            DocumentMetadata { title: Some(String::new()) },
            None,
            UNTITLED,
        );

        assert_eq!(record.title, "Untitled");
        assert!(record.content.is_none());
        assert!(record.last_saved_at.is_none());
    }

    #[test]
    fn test_null_tree_counts_as_no_content() {
        let record = DocumentRecord::assemble(
            id(),
            DocumentMetadata { title: None },
            Some(StoredContent {
                content: Some(serde_json::Value::Null),
                updated_at: None,
            }),
            "Sin título",
        );

        assert_eq!(record.title, "Sin título");
        assert!(record.content.is_none());
    }
}
