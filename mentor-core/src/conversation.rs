//! Multi-turn conversation with the stateful tutoring backend.
//!
//! The session is a two-state machine, `Idle → Sending → Idle`. A send is split
//! into [`ConversationSession::prepare_send`] (synchronous: validates, appends
//! the user message, enters `Sending`) and [`ConversationSession::settle_send`]
//! (appends the assistant message or the fallback, returns to `Idle`). The UI
//! runs the network call between the two on a background task; headless
//! callers use [`ConversationSession::send`], which does all three in order.
//!
//! Failures never leave the session stuck: they become a fallback assistant
//! message, so the transcript always holds one reply per user message.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::TutorBackend;
use crate::error::ApiError;
use crate::notify::RefreshNotifier;
use crate::types::{ChatReply, Message};

/// Assistant message appended when a send fails for any reason.
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong while handling your message. Please try again later.";

/// Reply intent after which the learner's progress is refreshed.
pub const PROGRESS_INTENT: &str = "answer";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    #[default]
    Idle,
    /// A chat request is in flight; further sends are rejected, not queued.
    Sending,
}

/// The chat request a prepared send needs issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub user_id: String,
    pub message: String,
    /// `None` on the first turn of the session.
    pub conversation_id: Option<String>,
}

pub struct ConversationSession {
    user_id: String,
    /// Latched to the first id the backend returns; never overwritten.
    conversation_id: Option<String>,
    transcript: Vec<Message>,
    state: SendState,
    notifier: Arc<dyn RefreshNotifier>,
}

impl ConversationSession {
    pub fn new(user_id: impl Into<String>, notifier: Arc<dyn RefreshNotifier>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            transcript: Vec::new(),
            state: SendState::Idle,
            notifier,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Messages in creation order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SendState::Sending
    }

    /// Starts a send of `input`.
    ///
    /// Returns `None` without touching the transcript when `input` is blank or
    /// a send is already in flight. Otherwise appends the user message, enters
    /// `Sending`, and returns the request the caller must issue and later pass
    /// to [`settle_send`](Self::settle_send).
    pub fn prepare_send(&mut self, input: &str) -> Option<OutgoingMessage> {
        if input.trim().is_empty() {
            return None;
        }
        if self.state == SendState::Sending {
            debug!("send ignored: a chat request is already in flight");
            return None;
        }

        self.transcript.push(Message::user(input));
        self.state = SendState::Sending;

        Some(OutgoingMessage {
            user_id: self.user_id.clone(),
            message: input.to_owned(),
            conversation_id: self.conversation_id.clone(),
        })
    }

    /// Completes the in-flight send with the backend's `result`.
    ///
    /// Always returns the session to `Idle`. A result arriving while no send
    /// is in flight is dropped.
    pub fn settle_send(&mut self, result: Result<ChatReply, ApiError>) {
        if self.state != SendState::Sending {
            warn!("chat result arrived with no send in flight; dropped");
            return;
        }

        match result {
            Ok(reply) => {
                if self.conversation_id.is_none() && !reply.conversation_id.is_empty() {
                    info!(conversation_id = %reply.conversation_id, "conversation started");
                    self.conversation_id = Some(reply.conversation_id);
                }
                let refresh = reply.intent == PROGRESS_INTENT;
                self.transcript.push(Message::assistant(
                    reply.response,
                    Some(reply.intent),
                    reply.sources,
                ));
                if refresh {
                    self.notifier.progress_changed();
                }
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.failure_kind(), "chat send failed");
                self.transcript.push(Message::assistant(FALLBACK_REPLY, None, None));
            }
        }

        self.state = SendState::Idle;
    }

    /// Sends `input` through `backend` and settles the result.
    ///
    /// Returns `false` when the send was skipped (blank input or busy).
    pub async fn send(&mut self, backend: &dyn TutorBackend, input: &str) -> bool {
        let Some(out) = self.prepare_send(input) else {
            return false;
        };
        let result = backend
            .send_chat_message(&out.user_id, &out.message, out.conversation_id.as_deref())
            .await;
        self.settle_send(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{rejection, reply, CountingNotifier, ScriptedBackend};
    use crate::types::Role;

    fn session(notifier: &Arc<CountingNotifier>) -> ConversationSession {
        ConversationSession::new("user_1_abcdefghi", notifier.clone())
    }

    #[tokio::test]
    async fn first_turn_records_reply_and_conversation_id() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::with_chat(vec![Ok(reply("c1", "hi", "greeting"))]);
        let mut s = session(&notifier);

        assert!(s.send(&backend, "hello").await);

        let t = s.transcript();
        assert_eq!(t.len(), 2);
        assert_eq!((t[0].role, t[0].content.as_str()), (Role::User, "hello"));
        assert_eq!((t[1].role, t[1].content.as_str()), (Role::Assistant, "hi"));
        assert_eq!(t[1].intent.as_deref(), Some("greeting"));
        assert_eq!(s.conversation_id(), Some("c1"));
        assert_eq!(notifier.progress_count(), 0);
        assert_eq!(s.state(), SendState::Idle);
        assert_eq!(*backend.seen_conversation_ids.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn conversation_id_is_latched_to_first_value() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::with_chat(vec![
            Ok(reply("abc", "one", "learn")),
            Ok(reply("xyz", "two", "learn")),
        ]);
        let mut s = session(&notifier);

        s.send(&backend, "first").await;
        s.send(&backend, "second").await;

        assert_eq!(s.conversation_id(), Some("abc"));
        assert_eq!(
            *backend.seen_conversation_ids.lock().unwrap(),
            vec![None, Some("abc".to_owned())]
        );
    }

    #[tokio::test]
    async fn transcript_holds_two_messages_per_attempt_in_order() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::with_chat(vec![
            Ok(reply("c1", "r0", "chat")),
            Err(rejection(500, "boom")),
            Ok(reply("c1", "r2", "review")),
            Err(rejection(503, "down")),
        ]);
        let mut s = session(&notifier);

        for i in 0..4 {
            s.send(&backend, &format!("q{i}")).await;
        }

        let t = s.transcript();
        assert_eq!(t.len(), 8);
        for i in 0..4 {
            assert_eq!(t[2 * i].role, Role::User);
            assert_eq!(t[2 * i].content, format!("q{i}"));
            assert_eq!(t[2 * i + 1].role, Role::Assistant);
        }
        assert_eq!(t[1].content, "r0");
        assert_eq!(t[3].content, FALLBACK_REPLY);
        assert_eq!(t[5].content, "r2");
        assert_eq!(t[7].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn failure_keeps_conversation_id_unset() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::with_chat(vec![Err(rejection(500, "x"))]);
        let mut s = session(&notifier);

        s.send(&backend, "hello").await;

        assert_eq!(s.conversation_id(), None);
        assert_eq!(s.state(), SendState::Idle);
        assert!(s.transcript()[1].intent.is_none());
    }

    #[test]
    fn second_send_while_in_flight_is_a_no_op() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut s = session(&notifier);

        let first = s.prepare_send("one");
        assert!(first.is_some());
        assert!(s.is_sending());
        assert!(s.prepare_send("two").is_none());
        assert_eq!(s.transcript().len(), 1);

        s.settle_send(Ok(reply("c9", "ok", "chat")));
        assert!(!s.is_sending());
        let next = s.prepare_send("two").unwrap();
        assert_eq!(next.conversation_id.as_deref(), Some("c9"));
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_backend() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::default();
        let mut s = session(&notifier);

        assert!(!s.send(&backend, "   \n").await);
        assert!(s.transcript().is_empty());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answer_intent_signals_progress_refresh() {
        let notifier = Arc::new(CountingNotifier::default());
        let backend = ScriptedBackend::with_chat(vec![
            Ok(reply("c1", "correct!", "answer")),
            Ok(reply("c1", "sure", "learn")),
        ]);
        let mut s = session(&notifier);

        s.send(&backend, "42").await;
        assert_eq!(notifier.progress_count(), 1);
        s.send(&backend, "teach me").await;
        assert_eq!(notifier.progress_count(), 1);
    }

    #[test]
    fn stale_result_is_dropped() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut s = session(&notifier);

        s.settle_send(Ok(reply("c1", "late", "answer")));

        assert!(s.transcript().is_empty());
        assert_eq!(s.conversation_id(), None);
        assert_eq!(notifier.progress_count(), 0);
    }
}
