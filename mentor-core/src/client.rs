//! Typed HTTP client for the tutoring backend.
//!
//! Every operation is exactly one request/response exchange: no retries, no
//! backoff, no streaming, and no client-side timeout. Failure handling belongs
//! to the orchestration components that call through [`TutorBackend`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::types::{
    ChatReply, ChatRequest, ChunkConfig, KnowledgeInfo, ProgressUpdate, ReindexOutcome,
    ReindexRequest, SearchEnvelope, SettingsAck, UploadReceipt, UserProgress,
};

/// Number of search hits requested when the caller has no preference.
pub const DEFAULT_SEARCH_K: usize = 5;

/// One method per backend capability.
///
/// `ApiClient` is the production implementation; orchestration components only
/// ever see this trait so they can be driven by a scripted backend in tests.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    async fn send_chat_message(
        &self,
        user_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, ApiError>;

    async fn upload_document(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadReceipt, ApiError>;

    async fn get_progress(&self, user_id: &str) -> Result<UserProgress, ApiError>;

    async fn update_progress(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<UserProgress, ApiError>;

    async fn get_knowledge_info(&self) -> Result<KnowledgeInfo, ApiError>;

    async fn search_knowledge(&self, query: &str, k: usize) -> Result<Vec<String>, ApiError>;

    async fn get_chunk_settings(&self) -> Result<ChunkConfig, ApiError>;

    async fn update_chunk_settings(
        &self,
        chunk_size: u32,
        chunk_overlap: u32,
    ) -> Result<SettingsAck, ApiError>;

    async fn reindex(
        &self,
        chunk_size: u32,
        chunk_overlap: u32,
        confirm: bool,
    ) -> Result<ReindexOutcome, ApiError>;
}

/// `reqwest`-backed [`TutorBackend`] bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

/// `POST /api/progress/{id}` answers either with the refreshed progress or
/// with a bare acknowledgement, depending on the backend version.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProgressReply {
    Progress(UserProgress),
    Ack { message: String },
}

impl ApiClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the URL does not parse, is not
    /// http(s), or cannot carry a path; `ApiError::Transport` if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let invalid = |reason: &str| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: reason.to_owned(),
        };
        let parsed = Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("only http and https are supported"));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path"));
        }

        let http = Client::builder()
            .user_agent(concat!("mentor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url: parsed })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path `segments` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Turns a response into `T`, mapping non-2xx statuses to `ApiError::Rejected`.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let err = ApiError::rejected(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "backend rejected request");
        return Err(err);
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl TutorBackend for ApiClient {
    async fn send_chat_message(
        &self,
        user_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        let url = self.endpoint(&["api", "chat"]);
        debug!(url = %url, conversation_id = ?conversation_id, "sending chat message");
        let body = ChatRequest { user_id, message, conversation_id };
        let resp = self.http.post(url).json(&body).send().await?;
        decode(resp).await
    }

    async fn upload_document(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(&["api", "upload"]);
        debug!(url = %url, filename, bytes = file_bytes.len(), "uploading document");
        let part = Part::bytes(file_bytes).file_name(filename.to_owned());
        let form = Form::new().part("file", part);
        let resp = self.http.post(url).multipart(form).send().await?;
        decode(resp).await
    }

    async fn get_progress(&self, user_id: &str) -> Result<UserProgress, ApiError> {
        let url = self.endpoint(&["api", "progress", user_id]);
        debug!(url = %url, "fetching progress");
        let resp = self.http.get(url).send().await?;
        decode(resp).await
    }

    async fn update_progress(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<UserProgress, ApiError> {
        let url = self.endpoint(&["api", "progress", user_id]);
        debug!(url = %url, topic = %update.topic, "updating progress");
        let resp = self.http.post(url).json(update).send().await?;
        match decode::<ProgressReply>(resp).await? {
            ProgressReply::Progress(progress) => Ok(progress),
            ProgressReply::Ack { message } => {
                debug!(%message, "progress update acknowledged; re-fetching");
                self.get_progress(user_id).await
            }
        }
    }

    async fn get_knowledge_info(&self) -> Result<KnowledgeInfo, ApiError> {
        let url = self.endpoint(&["api", "knowledge", "info"]);
        debug!(url = %url, "fetching knowledge info");
        let resp = self.http.get(url).send().await?;
        decode(resp).await
    }

    async fn search_knowledge(&self, query: &str, k: usize) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["api", "knowledge", "search"]);
        debug!(url = %url, query, k, "searching knowledge base");
        let resp = self
            .http
            .post(url)
            .query(&[("query", query.to_owned()), ("k", k.to_string())])
            .send()
            .await?;
        let envelope: SearchEnvelope = decode(resp).await?;
        Ok(envelope.results)
    }

    async fn get_chunk_settings(&self) -> Result<ChunkConfig, ApiError> {
        let url = self.endpoint(&["api", "knowledge", "chunk-settings"]);
        debug!(url = %url, "fetching chunk settings");
        let resp = self.http.get(url).send().await?;
        decode(resp).await
    }

    async fn update_chunk_settings(
        &self,
        chunk_size: u32,
        chunk_overlap: u32,
    ) -> Result<SettingsAck, ApiError> {
        let url = self.endpoint(&["api", "knowledge", "chunk-settings"]);
        debug!(url = %url, chunk_size, chunk_overlap, "saving chunk settings");
        let body = ChunkConfig { chunk_size, chunk_overlap };
        let resp = self.http.post(url).json(&body).send().await?;
        decode(resp).await
    }

    async fn reindex(
        &self,
        chunk_size: u32,
        chunk_overlap: u32,
        confirm: bool,
    ) -> Result<ReindexOutcome, ApiError> {
        let url = self.endpoint(&["api", "knowledge", "reindex"]);
        debug!(url = %url, chunk_size, chunk_overlap, confirm, "requesting reindex");
        let body = ReindexRequest { chunk_size, chunk_overlap, confirm };
        let resp = self.http.post(url).json(&body).send().await?;
        decode(resp).await
    }
}
