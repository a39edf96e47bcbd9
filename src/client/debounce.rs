//! Trailing-edge debouncing of edits into analyze requests

use super::LiveSession;
use crate::types::Language;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Quiet period used when none is configured
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Destination of debounced requests
pub trait AnalyzeSink: Send + Sync + 'static {
    /// Whether requests can currently be sent
    fn is_open(&self) -> bool;

    /// Send one request, returning its sequence number if it went out
    fn send_analyze(&self, language: &str, code: &str) -> Option<u64>;
}

impl AnalyzeSink for LiveSession {
    fn is_open(&self) -> bool {
        LiveSession::is_open(self)
    }

    fn send_analyze(&self, language: &str, code: &str) -> Option<u64> {
        LiveSession::send_analyze(self, language, code)
    }
}

/// Delays analyze requests until edits stop for the quiet period.
///
/// Every change cancels the pending emission and restarts the timer; the
/// emission carries the text as of the last change.
pub struct EditDebouncer<S: AnalyzeSink> {
    sink: Arc<S>,
    quiet_period: Duration,
    pending: Mutex<Option<AbortHandle>>,
}

impl<S: AnalyzeSink> EditDebouncer<S> {
    /// Create a debouncer in front of `sink`
    pub fn new(sink: Arc<S>, quiet_period: Duration) -> Self {
        Self {
            sink,
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    /// The sink requests are sent to
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Record an edit.
    ///
    /// Ignored (after cancelling any pending emission) while the sink is not
    /// open. Empty code is never sent.
    pub fn on_change(&self, language: Language, code: impl Into<String>) {
        self.cancel();

        if !self.sink.is_open() {
            log::debug!("Ignoring edit: session not open");
            return;
        }
        let code = code.into();
        if code.is_empty() {
            return;
        }

        let sink = Arc::clone(&self.sink);
        let delay = self.quiet_period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sink.is_open() {
                sink.send_analyze(language.id(), &code);
            }
        })
        .abort_handle();

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Cancel the pending emission, if any
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    /// Whether an emission is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<S: AnalyzeSink> Drop for EditDebouncer<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
