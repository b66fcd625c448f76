//! Launch context parsed from the iframe URL

use crate::DocumentId;
use thiserror::Error;
use url::Url;

/// Query parameter carrying the initial document id
pub const DOC_ID_PARAM: &str = "docId";

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Invalid launch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// What the editor knows at startup, before any host message arrives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchContext {
    pub document_id: Option<DocumentId>,
}

impl LaunchContext {
    /// Read `docId` from the launch URL's query; a blank value counts as absent
    pub fn from_url(raw: &str) -> Result<Self, LaunchError> {
        let url = Url::parse(raw)?;
        let document_id = url
            .query_pairs()
            .find(|(key, _)| key == DOC_ID_PARAM)
            .and_then(|(_, value)| DocumentId::parse(&value));

        Ok(Self { document_id })
    }

    pub fn with_document(id: DocumentId) -> Self {
        Self {
            document_id: Some(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_doc_id() {
        let launch = LaunchContext::from_url("https://editor.example.com/?docId=doc1").unwrap();
        assert_eq!(launch.document_id, DocumentId::parse("doc1"));
    }

    #[test]
    fn test_percent_decoding_and_other_params() {
        let launch =
            LaunchContext::from_url("https://editor.example.com/embed?theme=dark&docId=my%20song").unwrap();
        assert_eq!(launch.document_id.unwrap().as_str(), "my song");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let launch = LaunchContext::from_url("https://e.example.com/?docId=a&docId=b").unwrap();
        assert_eq!(launch.document_id.unwrap().as_str(), "a");
    }

    #[test]
    fn test_absent_or_blank_doc_id() {
        let launch = LaunchContext::from_url("https://editor.example.com/").unwrap();
        assert!(launch.document_id.is_none());

        let launch = LaunchContext::from_url("https://editor.example.com/?docId=").unwrap();
        assert!(launch.document_id.is_none());
    }

    #[test]
    fn test_invalid_url() {
        assert!(LaunchContext::from_url("not a url").is_err());
    }
}
