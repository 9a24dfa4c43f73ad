/// Receives "something the user sees elsewhere is stale" signals from the
/// orchestration components.
///
/// Calls are fire-and-forget: implementations must not block and the caller
/// never waits for the refresh they trigger.
pub trait RefreshNotifier: Send + Sync {
    /// The learner's progress may have changed (an `"answer"` reply settled).
    fn progress_changed(&self);

    /// The knowledge base contents or chunking changed.
    fn knowledge_changed(&self);
}

/// Notifier that drops every signal. Used where nothing needs refreshing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl RefreshNotifier for NoopNotifier {
    fn progress_changed(&self) {}

    fn knowledge_changed(&self) {}
}
