//! Chunking configuration and the guarded, destructive reindex action.
//!
//! Saving settings is a forward-looking config write: it never touches stored
//! documents. Reindexing rebuilds every chunk, so it takes two steps. The first
//! [`ChunkSettingsCoordinator::prepare_reindex`] only arms the action and shows
//! a warning; the second, from the armed state, dispatches the call. The armed
//! flag is cleared at dispatch, so every settled reindex (success, soft failure,
//! or hard failure) leaves the coordinator unarmed and a new destructive call
//! always needs a fresh arm step.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::TutorBackend;
use crate::error::{ApiError, FailureKind};
use crate::notify::RefreshNotifier;
use crate::types::{ChunkConfig, ReindexOutcome, SettingsAck};

pub const REINDEX_WARNING: &str = "Warning: reindexing deletes every existing document chunk \
     and rebuilds it from the uploaded files. This can take a long time. Confirm to continue.";
pub const LOAD_FAILED: &str = "Failed to load settings";
pub const SAVE_FAILED: &str = "Failed to save settings";
pub const REINDEX_FAILED: &str = "Reindexing failed";

const SIZE_STEP: u32 = 100;
const OVERLAP_STEP: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Message shown under the settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkField {
    Size,
    Overlap,
}

/// What a reindex request turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexStep {
    /// First step: armed and warned, nothing sent.
    Armed,
    /// Second step: the caller must issue a confirmed reindex with this config.
    Dispatch(ChunkConfig),
    /// A save or reindex is in flight; nothing changed.
    Busy,
}

pub struct ChunkSettingsCoordinator {
    config: ChunkConfig,
    armed: bool,
    saving: bool,
    reindexing: bool,
    notice: Option<Notice>,
    notifier: Arc<dyn RefreshNotifier>,
}

impl ChunkSettingsCoordinator {
    /// Starts with the default config until the backend's value loads.
    pub fn new(notifier: Arc<dyn RefreshNotifier>) -> Self {
        Self {
            config: ChunkConfig::default(),
            armed: false,
            saving: false,
            reindexing: false,
            notice: None,
            notifier,
        }
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_reindexing(&self) -> bool {
        self.reindexing
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Replaces both editable fields, clamped into range.
    pub fn set_config(&mut self, chunk_size: u32, chunk_overlap: u32) {
        self.config = ChunkConfig::clamped(chunk_size, chunk_overlap);
    }

    /// Sets one field from typed text. Unparseable text falls back to the
    /// field's default; parsed values are clamped.
    pub fn set_field_input(&mut self, field: ChunkField, text: &str) {
        let parsed = text.trim().parse::<u32>().ok();
        let ChunkConfig { chunk_size, chunk_overlap } = self.config;
        match field {
            ChunkField::Size => {
                self.set_config(parsed.unwrap_or(ChunkConfig::DEFAULT_SIZE), chunk_overlap)
            }
            ChunkField::Overlap => {
                self.set_config(chunk_size, parsed.unwrap_or(ChunkConfig::DEFAULT_OVERLAP))
            }
        }
    }

    /// Moves one field by `steps` increments (100 for size, 50 for overlap).
    pub fn nudge(&mut self, field: ChunkField, steps: i32) {
        let ChunkConfig { chunk_size, chunk_overlap } = self.config;
        let shift = |value: u32, step: u32| -> u32 {
            let delta = step.saturating_mul(steps.unsigned_abs());
            if steps >= 0 {
                value.saturating_add(delta)
            } else {
                value.saturating_sub(delta)
            }
        };
        match field {
            ChunkField::Size => self.set_config(shift(chunk_size, SIZE_STEP), chunk_overlap),
            ChunkField::Overlap => self.set_config(chunk_size, shift(chunk_overlap, OVERLAP_STEP)),
        }
    }

    /// Applies the result of fetching the backend's chunk settings.
    ///
    /// On failure the displayed fields are left exactly as they were.
    pub fn apply_loaded(&mut self, result: Result<ChunkConfig, ApiError>) {
        match result {
            Ok(cfg) => self.set_config(cfg.chunk_size, cfg.chunk_overlap),
            Err(e) => {
                warn!(error = %e, "loading chunk settings failed");
                self.notice = Some(Notice::error(LOAD_FAILED));
            }
        }
    }

    pub async fn load_settings(&mut self, backend: &dyn TutorBackend) {
        let result = backend.get_chunk_settings().await;
        self.apply_loaded(result);
    }

    /// Starts saving the current fields. `None` while a save or reindex runs.
    pub fn prepare_save(&mut self) -> Option<ChunkConfig> {
        if self.saving || self.reindexing {
            return None;
        }
        self.saving = true;
        self.notice = None;
        Some(self.config)
    }

    pub fn settle_save(&mut self, result: Result<SettingsAck, ApiError>) {
        self.saving = false;
        match result {
            Ok(ack) => {
                info!(chunk_size = self.config.chunk_size, chunk_overlap = self.config.chunk_overlap, "chunk settings saved");
                self.notice = Some(Notice::success(ack.warning.unwrap_or(ack.message)));
                self.notifier.knowledge_changed();
            }
            Err(e) => {
                warn!(error = %e, "saving chunk settings failed");
                self.notice = Some(Notice::error(e.user_detail().unwrap_or(SAVE_FAILED)));
            }
        }
    }

    /// Writes `chunk_size`/`chunk_overlap` as the new forward-looking config.
    ///
    /// Returns `false` when skipped because another settings call is in flight.
    pub async fn save_settings(
        &mut self,
        backend: &dyn TutorBackend,
        chunk_size: u32,
        chunk_overlap: u32,
    ) -> bool {
        if self.saving || self.reindexing {
            return false;
        }
        self.set_config(chunk_size, chunk_overlap);
        let Some(cfg) = self.prepare_save() else {
            return false;
        };
        let result = backend.update_chunk_settings(cfg.chunk_size, cfg.chunk_overlap).await;
        self.settle_save(result);
        true
    }

    /// Advances the two-step reindex gesture without any I/O.
    pub fn prepare_reindex(&mut self) -> ReindexStep {
        if self.reindexing || self.saving {
            return ReindexStep::Busy;
        }
        if !self.armed {
            self.armed = true;
            self.notice = Some(Notice::error(REINDEX_WARNING));
            return ReindexStep::Armed;
        }
        self.armed = false;
        self.reindexing = true;
        self.notice = None;
        ReindexStep::Dispatch(self.config)
    }

    pub fn settle_reindex(&mut self, result: Result<ReindexOutcome, ApiError>) {
        self.reindexing = false;
        self.armed = false;
        match result {
            Ok(outcome) if outcome.success => {
                info!(message = %outcome.message, "reindex finished");
                self.notice = Some(Notice::success(outcome.message));
                self.notifier.knowledge_changed();
            }
            Ok(outcome) => {
                warn!(kind = ?FailureKind::SoftFailure, message = %outcome.message, "reindex declined");
                self.notice = Some(Notice::error(outcome.message));
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.failure_kind(), "reindex failed");
                self.notice = Some(Notice::error(e.user_detail().unwrap_or(REINDEX_FAILED)));
            }
        }
    }

    /// Arms on the first call; issues the confirmed reindex on the second.
    pub async fn request_reindex(&mut self, backend: &dyn TutorBackend) -> ReindexStep {
        let step = self.prepare_reindex();
        if let ReindexStep::Dispatch(cfg) = step {
            let result = backend.reindex(cfg.chunk_size, cfg.chunk_overlap, true).await;
            self.settle_reindex(result);
        }
        step
    }

    /// Disarms a pending reindex and clears its warning. No I/O.
    pub fn cancel_reindex(&mut self) {
        if self.armed {
            self.armed = false;
            self.notice = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{rejection, CountingNotifier, ScriptedBackend};

    fn coordinator(notifier: &Arc<CountingNotifier>) -> ChunkSettingsCoordinator {
        ChunkSettingsCoordinator::new(notifier.clone())
    }

    fn outcome(success: bool, message: &str) -> ReindexOutcome {
        ReindexOutcome { success, message: message.to_owned(), stats: None }
    }

    #[tokio::test]
    async fn loaded_settings_replace_defaults() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_chunk_settings(Ok(ChunkConfig { chunk_size: 800, chunk_overlap: 150 }));
        let mut c = coordinator(&notifier);
        assert_eq!(c.config(), ChunkConfig::default());

        c.load_settings(&backend).await;

        assert_eq!(c.config(), ChunkConfig { chunk_size: 800, chunk_overlap: 150 });
        assert!(c.notice().is_none());
    }

    #[tokio::test]
    async fn failed_load_keeps_displayed_fields() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_chunk_settings(Err(rejection(500, "db down")));
        let mut c = coordinator(&notifier);
        c.set_config(1200, 300);

        c.load_settings(&backend).await;

        assert_eq!(c.config(), ChunkConfig { chunk_size: 1200, chunk_overlap: 300 });
        assert_eq!(c.notice(), Some(&Notice::error(LOAD_FAILED)));
    }

    #[tokio::test]
    async fn single_request_only_arms() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        let mut c = coordinator(&notifier);

        assert_eq!(c.request_reindex(&backend).await, ReindexStep::Armed);

        assert!(c.is_armed());
        assert_eq!(backend.reindex_calls.load(Ordering::SeqCst), 0);
        assert_eq!(c.notice().map(|n| n.text.as_str()), Some(REINDEX_WARNING));
    }

    #[tokio::test]
    async fn second_request_issues_exactly_one_confirmed_call() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_reindex(Ok(outcome(true, "Reindexed 3 sources into 42 chunks.")));
        let mut c = coordinator(&notifier);
        c.set_config(600, 60);

        c.request_reindex(&backend).await;
        let step = c.request_reindex(&backend).await;

        assert_eq!(step, ReindexStep::Dispatch(ChunkConfig { chunk_size: 600, chunk_overlap: 60 }));
        assert_eq!(backend.reindex_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*backend.seen_reindex_args.lock().unwrap(), vec![(600, 60, true)]);
        assert!(!c.is_armed());
        assert_eq!(c.notice(), Some(&Notice::success("Reindexed 3 sources into 42 chunks.")));
        assert_eq!(notifier.knowledge_count(), 1);
    }

    #[tokio::test]
    async fn cancel_resets_the_gate() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        let mut c = coordinator(&notifier);

        c.request_reindex(&backend).await;
        c.cancel_reindex();
        assert!(!c.is_armed());
        assert!(c.notice().is_none());

        assert_eq!(c.request_reindex(&backend).await, ReindexStep::Armed);
        assert_eq!(backend.reindex_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn soft_failure_disarms_and_shows_message() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_reindex(Ok(outcome(false, "Please confirm the reindex.")));
        let mut c = coordinator(&notifier);

        c.request_reindex(&backend).await;
        c.request_reindex(&backend).await;

        assert!(!c.is_armed());
        assert!(!c.is_reindexing());
        assert_eq!(c.notice(), Some(&Notice::error("Please confirm the reindex.")));
        assert_eq!(notifier.knowledge_count(), 0);
        // A further single request must arm again, not call.
        assert_eq!(c.request_reindex(&backend).await, ReindexStep::Armed);
        assert_eq!(backend.reindex_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hard_failure_disarms_and_shows_detail() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_reindex(Err(rejection(500, "embedding model offline")));
        let mut c = coordinator(&notifier);

        c.request_reindex(&backend).await;
        c.request_reindex(&backend).await;

        assert!(!c.is_armed());
        assert_eq!(c.notice(), Some(&Notice::error("embedding model offline")));
    }

    #[test]
    fn requests_while_in_flight_are_busy() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut c = coordinator(&notifier);

        assert_eq!(c.prepare_reindex(), ReindexStep::Armed);
        assert!(matches!(c.prepare_reindex(), ReindexStep::Dispatch(_)));
        assert_eq!(c.prepare_reindex(), ReindexStep::Busy);
        assert!(c.prepare_save().is_none());
        assert!(!c.is_armed());
    }

    #[tokio::test]
    async fn save_prefers_warning_over_message() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_settings_ack(Ok(SettingsAck {
            message: "saved".to_owned(),
            warning: Some("applies to new uploads only".to_owned()),
        }));
        backend.push_settings_ack(Ok(SettingsAck { message: "saved".to_owned(), warning: None }));
        let mut c = coordinator(&notifier);

        assert!(c.save_settings(&backend, 700, 100).await);
        assert_eq!(c.notice(), Some(&Notice::success("applies to new uploads only")));
        assert!(c.save_settings(&backend, 700, 100).await);
        assert_eq!(c.notice(), Some(&Notice::success("saved")));
        assert_eq!(c.config(), ChunkConfig { chunk_size: 700, chunk_overlap: 100 });
        assert_eq!(notifier.knowledge_count(), 2);
        assert!(!c.is_saving());
    }

    #[tokio::test]
    async fn failed_save_uses_fallback_text_without_detail() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        backend.push_settings_ack(Err(rejection(500, "")));
        let mut c = coordinator(&notifier);

        c.save_settings(&backend, 1000, 200).await;

        assert_eq!(c.notice(), Some(&Notice::error(SAVE_FAILED)));
        assert_eq!(backend.settings_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn typed_and_nudged_values_are_clamped() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut c = coordinator(&notifier);

        c.set_field_input(ChunkField::Size, "99999");
        assert_eq!(c.config().chunk_size, ChunkConfig::MAX_SIZE);
        c.set_field_input(ChunkField::Size, "abc");
        assert_eq!(c.config().chunk_size, ChunkConfig::DEFAULT_SIZE);
        c.set_field_input(ChunkField::Overlap, " 350 ");
        assert_eq!(c.config().chunk_overlap, 350);

        c.nudge(ChunkField::Overlap, -10);
        assert_eq!(c.config().chunk_overlap, 0);
        c.nudge(ChunkField::Size, 3);
        assert_eq!(c.config().chunk_size, 1300);
    }
}
