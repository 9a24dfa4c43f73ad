//! Central application state for mentor.
//!
//! Owns the mode, the active tab, the input buffers, and the core
//! coordinators. Key handlers mutate it; the renderer reads it. Backend calls
//! leave through [`AppState::dispatch`] and come back through
//! [`AppState::apply_response`], so nothing here awaits the network.

use std::sync::Arc;

use mentor_core::conversation::ConversationSession;
use mentor_core::notify::RefreshNotifier;
use mentor_core::settings::{ChunkField, ChunkSettingsCoordinator, ReindexStep};
use mentor_core::types::{KnowledgeInfo, UserProgress};
use mentor_core::upload::UploadCoordinator;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::event::Refresh;
use crate::worker::{ApiRequest, ApiResponse};

pub const PROGRESS_LOAD_FAILED: &str = "Could not load progress";
pub const SEARCH_FAILED: &str = "Search failed";

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the active tab's input line.
    Insert,
    HelpOverlay,
    /// Quit requested while backend calls are still in flight.
    ConfirmQuit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chat,
    Upload,
    Progress,
    Settings,
    Search,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Chat, Tab::Upload, Tab::Progress, Tab::Settings, Tab::Search];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Chat => "Chat",
            Tab::Upload => "Upload",
            Tab::Progress => "Progress",
            Tab::Settings => "Settings",
            Tab::Search => "Search",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether the tab has a text input that Insert mode edits.
    pub fn has_input(self) -> bool {
        !matches!(self, Tab::Progress)
    }
}

#[derive(Debug, Default)]
pub struct SearchState {
    /// Query of the most recent search sent.
    pub query: String,
    pub results: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once any search has settled, so "no results" can be told apart
    /// from "never searched".
    pub searched: bool,
}

#[derive(Debug, Default)]
pub struct ProgressState {
    pub data: Option<UserProgress>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct AppState {
    pub mode: Mode,
    pub tab: Tab,

    pub chat_input: String,
    pub upload_input: String,
    pub search_input: String,
    /// Text being typed into the selected settings field.
    pub settings_input: String,
    pub settings_field: ChunkField,

    /// Chat scroll distance from the newest line; 0 follows the tail.
    pub chat_scroll: u16,
    /// Inner height of the transcript pane, cached after each render.
    pub chat_viewport_height: u16,
    pub help_scroll: u16,
    /// Advanced on every tick; drives the busy spinner.
    pub spinner_frame: usize,

    pub session: ConversationSession,
    pub settings: ChunkSettingsCoordinator,
    pub upload: UploadCoordinator,
    pub progress: ProgressState,
    pub knowledge: Option<KnowledgeInfo>,
    pub search: SearchState,
    pub search_k: usize,

    /// Backend calls dispatched and not yet answered.
    pub in_flight: usize,
    api_tx: Option<UnboundedSender<ApiRequest>>,
}

impl AppState {
    pub fn new(
        user_id: impl Into<String>,
        notifier: Arc<dyn RefreshNotifier>,
        search_k: usize,
        api_tx: Option<UnboundedSender<ApiRequest>>,
    ) -> Self {
        Self {
            mode: Mode::default(),
            tab: Tab::default(),
            chat_input: String::new(),
            upload_input: String::new(),
            search_input: String::new(),
            settings_input: String::new(),
            settings_field: ChunkField::Size,
            chat_scroll: 0,
            chat_viewport_height: 0,
            help_scroll: 0,
            spinner_frame: 0,
            session: ConversationSession::new(user_id, Arc::clone(&notifier)),
            settings: ChunkSettingsCoordinator::new(Arc::clone(&notifier)),
            upload: UploadCoordinator::new(notifier),
            progress: ProgressState::default(),
            knowledge: None,
            search: SearchState::default(),
            search_k,
            in_flight: 0,
            api_tx,
        }
    }

    /// Hands `request` to the API worker. Returns whether it was sent.
    pub fn dispatch(&mut self, request: ApiRequest) -> bool {
        let Some(tx) = &self.api_tx else {
            return false;
        };
        if tx.send(request).is_err() {
            warn!("api worker is gone; request dropped");
            return false;
        }
        self.in_flight += 1;
        true
    }

    pub fn has_pending_requests(&self) -> bool {
        self.in_flight > 0
    }

    /// Fetches progress, knowledge info and chunk settings.
    pub fn load_initial(&mut self) {
        self.refresh_progress();
        self.refresh_knowledge();
        self.dispatch(ApiRequest::LoadChunkSettings);
    }

    pub fn refresh(&mut self, what: Refresh) {
        match what {
            Refresh::Progress => self.refresh_progress(),
            Refresh::Knowledge => self.refresh_knowledge(),
        }
    }

    pub fn refresh_progress(&mut self) {
        if self.dispatch(ApiRequest::LoadProgress) {
            self.progress.loading = true;
        }
    }

    pub fn refresh_knowledge(&mut self) {
        self.dispatch(ApiRequest::LoadKnowledgeInfo);
    }

    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    /// Switches tab. Leaving Settings disarms a pending reindex.
    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab == Tab::Settings && tab != Tab::Settings {
            self.settings.cancel_reindex();
        }
        self.tab = tab;
    }

    /// Buffer Insert mode edits on the current tab.
    pub fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.tab {
            Tab::Chat => Some(&mut self.chat_input),
            Tab::Upload => Some(&mut self.upload_input),
            Tab::Settings => Some(&mut self.settings_input),
            Tab::Search => Some(&mut self.search_input),
            Tab::Progress => None,
        }
    }

    pub fn active_input(&self) -> Option<&str> {
        match self.tab {
            Tab::Chat => Some(&self.chat_input),
            Tab::Upload => Some(&self.upload_input),
            Tab::Settings => Some(&self.settings_input),
            Tab::Search => Some(&self.search_input),
            Tab::Progress => None,
        }
    }

    /// Enters Insert mode on the current tab, seeding the settings buffer
    /// with the selected field's value.
    pub fn begin_insert(&mut self) {
        if !self.tab.has_input() {
            return;
        }
        if self.tab == Tab::Settings {
            let cfg = self.settings.config();
            let value = match self.settings_field {
                ChunkField::Size => cfg.chunk_size,
                ChunkField::Overlap => cfg.chunk_overlap,
            };
            self.settings_input = value.to_string();
        }
        self.mode = Mode::Insert;
    }

    /// Sends the chat input. The buffer is cleared only if the send started.
    pub fn submit_chat(&mut self) {
        let Some(out) = self.session.prepare_send(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();
        self.chat_scroll = 0;
        if !self.dispatch(ApiRequest::SendChat(out)) {
            self.session.settle_send(Err(worker_gone()));
        }
    }

    /// Selects the typed path for upload.
    pub fn submit_upload_path(&mut self) -> bool {
        let path = self.upload_input.trim().to_owned();
        if path.is_empty() {
            return false;
        }
        let accepted = self.upload.select_file(path);
        if accepted {
            self.upload_input.clear();
        }
        accepted
    }

    pub fn start_upload(&mut self) {
        let Some(file) = self.upload.prepare_upload() else {
            return;
        };
        if !self.dispatch(ApiRequest::Upload(file)) {
            self.upload.settle_upload(Err(worker_gone().into()));
        }
    }

    /// Applies the typed settings value to the selected field.
    pub fn commit_settings_input(&mut self) {
        let text = std::mem::take(&mut self.settings_input);
        self.settings.set_field_input(self.settings_field, &text);
    }

    pub fn save_settings(&mut self) {
        let Some(cfg) = self.settings.prepare_save() else {
            return;
        };
        if !self.dispatch(ApiRequest::SaveChunkSettings(cfg)) {
            self.settings.settle_save(Err(worker_gone()));
        }
    }

    /// First call arms, second dispatches the confirmed reindex.
    pub fn request_reindex(&mut self) {
        if let ReindexStep::Dispatch(cfg) = self.settings.prepare_reindex() {
            if !self.dispatch(ApiRequest::Reindex(cfg)) {
                self.settings.settle_reindex(Err(worker_gone()));
            }
        }
    }

    /// Sends the search input. Blank queries are skipped.
    pub fn submit_search(&mut self) {
        let query = self.search_input.trim().to_owned();
        if query.is_empty() || self.search.loading {
            return;
        }
        let request = ApiRequest::Search { query: query.clone(), k: self.search_k };
        if self.dispatch(request) {
            self.search.query = query;
            self.search.loading = true;
            self.search.error = None;
        }
    }

    /// Settles a finished backend call into the matching state.
    pub fn apply_response(&mut self, response: ApiResponse) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match response {
            ApiResponse::Chat(result) => self.session.settle_send(result),
            ApiResponse::Upload(result) => self.upload.settle_upload(result),
            ApiResponse::Progress(result) => {
                self.progress.loading = false;
                match result {
                    Ok(progress) => {
                        self.progress.data = Some(progress);
                        self.progress.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, kind = ?e.failure_kind(), "loading progress failed");
                        self.progress.error =
                            Some(e.user_detail().unwrap_or(PROGRESS_LOAD_FAILED).to_owned());
                    }
                }
            }
            ApiResponse::KnowledgeInfo(result) => match result {
                Ok(info) => self.knowledge = Some(info),
                Err(e) => warn!(error = %e, "loading knowledge info failed"),
            },
            ApiResponse::Search { query, result } => {
                if query != self.search.query {
                    return;
                }
                self.search.loading = false;
                self.search.searched = true;
                match result {
                    Ok(results) => {
                        self.search.results = results;
                        self.search.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "knowledge search failed");
                        self.search.results.clear();
                        self.search.error =
                            Some(e.user_detail().unwrap_or(SEARCH_FAILED).to_owned());
                    }
                }
            }
            ApiResponse::ChunkSettings(result) => self.settings.apply_loaded(result),
            ApiResponse::SettingsSaved(result) => self.settings.settle_save(result),
            ApiResponse::Reindexed(result) => self.settings.settle_reindex(result),
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Half the cached transcript height, at least one line.
    pub fn half_page(&self) -> u16 {
        (self.chat_viewport_height / 2).max(1)
    }
}

/// Error recorded when a request cannot reach the worker at all.
fn worker_gone() -> mentor_core::error::ApiError {
    mentor_core::error::ApiError::rejected(0, "request could not be dispatched")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::notify::NoopNotifier;
    use mentor_core::types::ReindexOutcome;
    use tokio::sync::mpsc;

    fn state_with_channel() -> (AppState, mpsc::UnboundedReceiver<ApiRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::new("user_1_abcdefghi", Arc::new(NoopNotifier), 5, Some(tx));
        (state, rx)
    }

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Search.next(), Tab::Chat);
        assert_eq!(Tab::Chat.prev(), Tab::Search);
        assert_eq!(Tab::Upload.index(), 1);
    }

    #[test]
    fn submit_chat_dispatches_and_clears_input() {
        let (mut state, mut rx) = state_with_channel();
        state.chat_input = "What is GDP?".to_owned();
        state.chat_scroll = 7;

        state.submit_chat();

        assert!(state.chat_input.is_empty());
        assert_eq!(state.chat_scroll, 0);
        assert!(state.session.is_sending());
        assert_eq!(state.in_flight, 1);
        match rx.try_recv() {
            Ok(ApiRequest::SendChat(out)) => {
                assert_eq!(out.message, "What is GDP?");
                assert_eq!(out.conversation_id, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn busy_session_keeps_the_typed_text() {
        let (mut state, mut rx) = state_with_channel();
        state.chat_input = "first".to_owned();
        state.submit_chat();
        state.chat_input = "second".to_owned();
        state.submit_chat();

        assert_eq!(state.chat_input, "second");
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn chat_without_worker_settles_with_fallback() {
        let mut state = AppState::new("u", Arc::new(NoopNotifier), 5, None);
        state.chat_input = "hello".to_owned();
        state.submit_chat();

        assert!(!state.session.is_sending());
        assert_eq!(state.session.transcript().len(), 2);
        assert_eq!(
            state.session.transcript()[1].content,
            mentor_core::conversation::FALLBACK_REPLY
        );
    }

    #[test]
    fn leaving_settings_disarms_reindex() {
        let (mut state, _rx) = state_with_channel();
        state.switch_tab(Tab::Settings);
        state.request_reindex();
        assert!(state.settings.is_armed());

        state.switch_tab(Tab::Chat);
        assert!(!state.settings.is_armed());
        assert!(state.settings.notice().is_none());
    }

    #[test]
    fn second_reindex_request_dispatches_and_settles() {
        let (mut state, mut rx) = state_with_channel();
        state.request_reindex();
        assert!(rx.try_recv().is_err());
        state.request_reindex();
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::Reindex(_))));
        assert!(state.settings.is_reindexing());

        state.apply_response(ApiResponse::Reindexed(Ok(ReindexOutcome {
            success: false,
            message: "No sources on record".to_owned(),
            stats: None,
        })));
        assert!(!state.settings.is_reindexing());
        assert!(!state.settings.is_armed());
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.settings.prepare_reindex(), ReindexStep::Armed);
    }

    #[test]
    fn blank_search_is_skipped() {
        let (mut state, mut rx) = state_with_channel();
        state.search_input = "   ".to_owned();
        state.submit_search();
        assert!(rx.try_recv().is_err());
        assert!(!state.search.loading);
    }

    #[test]
    fn stale_search_result_is_ignored() {
        let (mut state, _rx) = state_with_channel();
        state.search_input = "inflation".to_owned();
        state.submit_search();

        state.apply_response(ApiResponse::Search {
            query: "older".to_owned(),
            result: Ok(vec!["stale".to_owned()]),
        });
        assert!(state.search.loading);
        assert!(state.search.results.is_empty());

        state.apply_response(ApiResponse::Search {
            query: "inflation".to_owned(),
            result: Ok(vec!["CPI measures prices".to_owned()]),
        });
        assert!(!state.search.loading);
        assert_eq!(state.search.results, vec!["CPI measures prices"]);
    }

    #[test]
    fn progress_error_without_detail_uses_fallback() {
        let (mut state, _rx) = state_with_channel();
        state.refresh_progress();
        assert!(state.progress.loading);
        state.apply_response(ApiResponse::Progress(Err(
            mentor_core::error::ApiError::rejected(500, ""),
        )));
        assert!(!state.progress.loading);
        assert_eq!(state.progress.error.as_deref(), Some(PROGRESS_LOAD_FAILED));
    }

    #[test]
    fn settings_insert_is_seeded_and_committed() {
        let (mut state, _rx) = state_with_channel();
        state.switch_tab(Tab::Settings);
        state.settings_field = ChunkField::Overlap;
        state.begin_insert();
        assert_eq!(state.settings_input, "200");

        state.settings_input = "5000".to_owned();
        state.commit_settings_input();
        assert_eq!(state.settings.config().chunk_overlap, 1000);
        assert!(state.settings_input.is_empty());
    }
}
