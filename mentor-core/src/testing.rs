//! Scripted in-memory backend and recording notifier for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::TutorBackend;
use crate::error::ApiError;
use crate::notify::RefreshNotifier;
use crate::types::{
    ChatReply, ChunkConfig, KnowledgeInfo, ProgressUpdate, ReindexOutcome, SettingsAck,
    UploadReceipt, UserProgress,
};

/// Backend whose answers are queued up front, one per expected call.
///
/// Each operation pops the next scripted result; an unscripted call answers
/// with a 500 rejection so a test never hangs on a missing script entry.
#[derive(Default)]
pub struct ScriptedBackend {
    pub chat: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
    pub chunk_settings: Mutex<VecDeque<Result<ChunkConfig, ApiError>>>,
    pub settings_acks: Mutex<VecDeque<Result<SettingsAck, ApiError>>>,
    pub reindexes: Mutex<VecDeque<Result<ReindexOutcome, ApiError>>>,
    pub uploads: Mutex<VecDeque<Result<UploadReceipt, ApiError>>>,

    pub chat_calls: AtomicUsize,
    pub reindex_calls: AtomicUsize,
    pub settings_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    /// Conversation ids passed to `send_chat_message`, in call order.
    pub seen_conversation_ids: Mutex<Vec<Option<String>>>,
    /// `(chunk_size, chunk_overlap, confirm)` of every reindex call.
    pub seen_reindex_args: Mutex<Vec<(u32, u32, bool)>>,
}

pub fn reply(conversation_id: &str, response: &str, intent: &str) -> ChatReply {
    ChatReply {
        conversation_id: conversation_id.to_owned(),
        response: response.to_owned(),
        intent: intent.to_owned(),
        sources: None,
    }
}

pub fn rejection(status: u16, detail: &str) -> ApiError {
    ApiError::Rejected { status, detail: detail.to_owned() }
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(rejection(500, "unscripted call")))
}

impl ScriptedBackend {
    pub fn with_chat(replies: Vec<Result<ChatReply, ApiError>>) -> Self {
        let backend = Self::default();
        backend.chat.lock().unwrap().extend(replies);
        backend
    }

    pub fn push_chunk_settings(&self, result: Result<ChunkConfig, ApiError>) {
        self.chunk_settings.lock().unwrap().push_back(result);
    }

    pub fn push_settings_ack(&self, result: Result<SettingsAck, ApiError>) {
        self.settings_acks.lock().unwrap().push_back(result);
    }

    pub fn push_reindex(&self, result: Result<ReindexOutcome, ApiError>) {
        self.reindexes.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, result: Result<UploadReceipt, ApiError>) {
        self.uploads.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    async fn send_chat_message(
        &self,
        _user_id: &str,
        _message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_conversation_ids
            .lock()
            .unwrap()
            .push(conversation_id.map(str::to_owned));
        pop(&self.chat)
    }

    async fn upload_document(
        &self,
        _file_bytes: Vec<u8>,
        _filename: &str,
    ) -> Result<UploadReceipt, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.uploads)
    }

    async fn get_progress(&self, user_id: &str) -> Result<UserProgress, ApiError> {
        Ok(UserProgress {
            user_id: user_id.to_owned(),
            current_topic: None,
            mastery_level: Default::default(),
            mastered_topics: Default::default(),
            weak_points: Vec::new(),
            last_updated: None,
        })
    }

    async fn update_progress(
        &self,
        user_id: &str,
        _update: &ProgressUpdate,
    ) -> Result<UserProgress, ApiError> {
        self.get_progress(user_id).await
    }

    async fn get_knowledge_info(&self) -> Result<KnowledgeInfo, ApiError> {
        Ok(KnowledgeInfo { document_count: 0, collection_name: None })
    }

    async fn search_knowledge(&self, _query: &str, _k: usize) -> Result<Vec<String>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_chunk_settings(&self) -> Result<ChunkConfig, ApiError> {
        pop(&self.chunk_settings)
    }

    async fn update_chunk_settings(
        &self,
        _chunk_size: u32,
        _chunk_overlap: u32,
    ) -> Result<SettingsAck, ApiError> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.settings_acks)
    }

    async fn reindex(
        &self,
        chunk_size: u32,
        chunk_overlap: u32,
        confirm: bool,
    ) -> Result<ReindexOutcome, ApiError> {
        self.reindex_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_reindex_args
            .lock()
            .unwrap()
            .push((chunk_size, chunk_overlap, confirm));
        pop(&self.reindexes)
    }
}

/// Notifier that counts the signals it receives.
#[derive(Debug, Default)]
pub struct CountingNotifier {
    pub progress: AtomicUsize,
    pub knowledge: AtomicUsize,
}

impl CountingNotifier {
    pub fn progress_count(&self) -> usize {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn knowledge_count(&self) -> usize {
        self.knowledge.load(Ordering::SeqCst)
    }
}

impl RefreshNotifier for CountingNotifier {
    fn progress_changed(&self) {
        self.progress.fetch_add(1, Ordering::SeqCst);
    }

    fn knowledge_changed(&self) {
        self.knowledge.fetch_add(1, Ordering::SeqCst);
    }
}
