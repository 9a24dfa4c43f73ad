//! Background task that performs every backend call.
//!
//! The UI thread never awaits the network. It prepares a request through the
//! matching coordinator, sends an [`ApiRequest`] here, and later receives the
//! outcome as `AppEvent::Api`. Each request runs in its own tokio task, so a
//! slow reindex does not hold up a knowledge-info refresh.

use std::sync::Arc;

use mentor_core::client::TutorBackend;
use mentor_core::conversation::OutgoingMessage;
use mentor_core::error::ApiError;
use mentor_core::notify::RefreshNotifier;
use mentor_core::types::{
    ChatReply, ChunkConfig, KnowledgeInfo, ReindexOutcome, SettingsAck, UploadReceipt,
    UserProgress,
};
use mentor_core::upload::{self, SelectedFile, UploadError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::event::{AppEvent, Refresh};

#[derive(Debug, Clone)]
pub enum ApiRequest {
    SendChat(OutgoingMessage),
    Upload(SelectedFile),
    LoadProgress,
    LoadKnowledgeInfo,
    Search { query: String, k: usize },
    LoadChunkSettings,
    SaveChunkSettings(ChunkConfig),
    Reindex(ChunkConfig),
}

#[derive(Debug)]
pub enum ApiResponse {
    Chat(Result<ChatReply, ApiError>),
    Upload(Result<UploadReceipt, UploadError>),
    Progress(Result<UserProgress, ApiError>),
    KnowledgeInfo(Result<KnowledgeInfo, ApiError>),
    Search {
        query: String,
        result: Result<Vec<String>, ApiError>,
    },
    ChunkSettings(Result<ChunkConfig, ApiError>),
    SettingsSaved(Result<SettingsAck, ApiError>),
    Reindexed(Result<ReindexOutcome, ApiError>),
}

/// Receives requests until every sender is dropped, spawning one task per
/// request. Results go back to the main loop as `AppEvent::Api`.
pub async fn api_worker_loop(
    backend: Arc<dyn TutorBackend>,
    user_id: String,
    mut rx: UnboundedReceiver<ApiRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    while let Some(request) = rx.recv().await {
        let backend = Arc::clone(&backend);
        let user_id = user_id.clone();
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            let response = handle_request(backend.as_ref(), &user_id, request).await;
            let _ = event_tx.send(AppEvent::Api(Box::new(response)));
        });
    }
    debug!("api worker stopped: request channel closed");
}

/// Runs one request against `backend`.
pub async fn handle_request(
    backend: &dyn TutorBackend,
    user_id: &str,
    request: ApiRequest,
) -> ApiResponse {
    debug!(?request, "api request");
    match request {
        ApiRequest::SendChat(out) => ApiResponse::Chat(
            backend
                .send_chat_message(&out.user_id, &out.message, out.conversation_id.as_deref())
                .await,
        ),
        ApiRequest::Upload(file) => ApiResponse::Upload(upload::transfer(backend, &file).await),
        ApiRequest::LoadProgress => ApiResponse::Progress(backend.get_progress(user_id).await),
        ApiRequest::LoadKnowledgeInfo => {
            ApiResponse::KnowledgeInfo(backend.get_knowledge_info().await)
        }
        ApiRequest::Search { query, k } => {
            let result = backend.search_knowledge(&query, k).await;
            ApiResponse::Search { query, result }
        }
        ApiRequest::LoadChunkSettings => {
            ApiResponse::ChunkSettings(backend.get_chunk_settings().await)
        }
        ApiRequest::SaveChunkSettings(cfg) => ApiResponse::SettingsSaved(
            backend
                .update_chunk_settings(cfg.chunk_size, cfg.chunk_overlap)
                .await,
        ),
        ApiRequest::Reindex(cfg) => ApiResponse::Reindexed(
            backend
                .reindex(cfg.chunk_size, cfg.chunk_overlap, true)
                .await,
        ),
    }
}

/// Turns refresh signals from the core coordinators into `AppEvent::Refresh`.
///
/// Sending on an unbounded channel never blocks, and a closed channel only
/// means the app is shutting down.
pub struct ChannelNotifier {
    tx: UnboundedSender<AppEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl RefreshNotifier for ChannelNotifier {
    fn progress_changed(&self) {
        let _ = self.tx.send(AppEvent::Refresh(Refresh::Progress));
    }

    fn knowledge_changed(&self) {
        let _ = self.tx.send(AppEvent::Refresh(Refresh::Knowledge));
    }
}
