//! # REST Persistence Gateway
//!
//! Talks to a PostgREST data API and a GoTrue auth API behind one base URL.
//!
//! ```text
//! GET   /auth/v1/user                                   token → user id
//! GET   /rest/v1/docs?id=eq.{id}&select=title           one row or 406
//! GET   /rest/v1/doc_content?doc_id=eq.{id}&select=…    zero or one row
//! POST  /rest/v1/doc_content?on_conflict=doc_id         upsert
//! PATCH /rest/v1/docs?id=eq.{id}                        rename
//! ```
//!
//! Requests carry the anon key as `apikey` and the session token, or the
//! anon key when there is none, as the bearer token.

use crate::config::BackendConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use songframe_editor::{
    AuthSession, ContentWrite, DocumentId, DocumentMetadata, GatewayError, PersistenceGateway,
    StoredContent,
};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Error, Debug)]
pub enum RestError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx reply; `message` is the backend's own wording when present
    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

impl From<RestError> for GatewayError {
    fn from(e: RestError) -> Self {
        GatewayError::new(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentRow {
    content_json: Option<Value>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ContentUpsert<'a> {
    doc_id: &'a str,
    content_json: &'a Value,
    updated_by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TitleUpdate<'a> {
    title: &'a str,
}

/// Error bodies from either API
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

pub struct RestGateway {
    client: Client,
    base: Url,
    anon_key: String,
    session: Mutex<Option<AuthSession>>,
}

impl RestGateway {
    pub fn new(backend: &BackendConfig) -> Result<Self, RestError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base: base_url(&backend.url)?,
            anon_key: backend.anon_key.clone(),
            session: Mutex::new(None),
        })
    }

    /// `/rest/v1/{table}` with the given query
    fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, RestError> {
        let mut url = self.base.join(&format!("rest/v1/{}", table))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn session(&self) -> Option<AuthSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        request
            .header("apikey", self.anon_key.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
    }

    fn data_request(&self, request: RequestBuilder) -> RequestBuilder {
        let session = self.session();
        self.authorized(request, session.as_ref().map(|s| s.access_token.as_str()))
    }
}

fn base_url(raw: &str) -> Result<Url, RestError> {
    // Without a trailing slash `join` would drop the last path segment
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

async fn check(response: Response) -> Result<Response, RestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RestError::Status {
        status,
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    [parsed.message, parsed.msg, parsed.error_description, parsed.error]
        .into_iter()
        .flatten()
        .map(|message| message.trim().to_string())
        .find(|message| !message.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|body| !body.is_empty()))
        .unwrap_or_else(|| {
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        })
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>, GatewayError> {
        Ok(self.session())
    }

    async fn set_session(&self, token: &str) -> Result<AuthSession, GatewayError> {
        let url = self.base.join("auth/v1/user").map_err(RestError::from)?;
        let request = self.authorized(self.client.get(url), Some(token));
        let response = check(request.send().await.map_err(RestError::from)?).await?;
        let user: UserRow = response.json().await.map_err(RestError::from)?;

        let session = AuthSession {
            user_id: user.id,
            access_token: token.to_string(),
        };
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        tracing::info!("[RestGateway] session established for {}", session.user_id);
        Ok(session)
    }

    async fn document_metadata(&self, id: &DocumentId) -> Result<DocumentMetadata, GatewayError> {
        let url = self.table_url(
            "docs",
            &[("id", eq(id.as_str())), ("select", "title".to_string())],
        )?;
        let request = self.data_request(self.client.get(url).header(ACCEPT, SINGLE_OBJECT));
        let response = check(request.send().await.map_err(RestError::from)?).await?;
        let row: TitleRow = response.json().await.map_err(RestError::from)?;
        Ok(DocumentMetadata { title: row.title })
    }

    async fn document_content(&self, id: &DocumentId) -> Result<Option<StoredContent>, GatewayError> {
        let url = self.table_url(
            "doc_content",
            &[
                ("doc_id", eq(id.as_str())),
                ("select", "content_json,updated_at".to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        let request = self.data_request(self.client.get(url));
        let response = check(request.send().await.map_err(RestError::from)?).await?;
        let rows: Vec<ContentRow> = response.json().await.map_err(RestError::from)?;

        Ok(rows.into_iter().next().map(|row| StoredContent {
            content: row.content_json,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert_content(&self, write: ContentWrite) -> Result<(), GatewayError> {
        let url = self.table_url("doc_content", &[("on_conflict", "doc_id".to_string())])?;
        let body = ContentUpsert {
            doc_id: write.document_id.as_str(),
            content_json: &write.content,
            updated_by: write.updated_by.as_deref(),
        };
        let request = self.data_request(
            self.client
                .post(url)
                .header("Prefer", MERGE_DUPLICATES)
                .json(&body),
        );
        check(request.send().await.map_err(RestError::from)?).await?;
        Ok(())
    }

    async fn update_title(&self, id: &DocumentId, title: &str) -> Result<(), GatewayError> {
        let url = self.table_url("docs", &[("id", eq(id.as_str()))])?;
        let request = self.data_request(self.client.patch(url).json(&TitleUpdate { title }));
        check(request.send().await.map_err(RestError::from)?).await?;
        Ok(())
    }
}
