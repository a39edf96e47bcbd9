//! Client side of the live session socket

use super::{ConnectionState, DiagnosticsView};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::{LivelintError, Result};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Default bound of the outbound frame queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Tunables for a [`LiveSession`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Outbound frames buffered before sends are dropped
    pub queue_capacity: usize,
    /// Mark the view stale if the latest request is unanswered this long
    pub response_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            response_timeout: None,
        }
    }
}

/// Sequence bookkeeping that decides which results are current
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTracker {
    last_sent: u64,
    answered: Option<u64>,
}

impl ResultTracker {
    /// Create a tracker that has sent nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next request will carry
    pub fn upcoming(&self) -> u64 {
        self.last_sent + 1
    }

    /// Record that `seq` went out
    pub fn record_sent(&mut self, seq: u64) {
        self.last_sent = self.last_sent.max(seq);
    }

    /// Latest sequence number sent, if any
    pub fn latest(&self) -> Option<u64> {
        (self.last_sent > 0).then_some(self.last_sent)
    }

    /// Decide whether a result with `seq` should replace the view.
    ///
    /// Results without a sequence number are always accepted. Numbered
    /// results are accepted only when they answer the latest request.
    pub fn accept(&mut self, seq: Option<u64>) -> bool {
        match seq {
            None => true,
            Some(seq) if Some(seq) == self.latest() => {
                self.answered = Some(seq);
                true
            }
            Some(_) => false,
        }
    }

    /// Whether `seq` is still the latest request and has no result yet
    pub fn is_awaiting(&self, seq: u64) -> bool {
        self.latest() == Some(seq) && self.answered != Some(seq)
    }
}

/// A persistent, token-authenticated connection to a livelint server.
///
/// Created in [`ConnectionState::Connecting`]; the handshake runs in the
/// background. Once [`ConnectionState::Closed`] the session is finished and
/// a new one must be created to reconnect.
pub struct LiveSession {
    state: Arc<watch::Sender<ConnectionState>>,
    view: Arc<watch::Sender<DiagnosticsView>>,
    tracker: Arc<Mutex<ResultTracker>>,
    outbound: mpsc::Sender<String>,
    close_signal: Arc<Notify>,
    options: SessionOptions,
    task: JoinHandle<()>,
}

/// Build `<endpoint>/ws?token=<token>`, mapping http(s) to ws(s)
pub fn session_url(endpoint: &str, token: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| LivelintError::Transport(format!("invalid endpoint {}: {}", endpoint, e)))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(LivelintError::Transport(format!(
                "unsupported endpoint scheme: {}",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| LivelintError::Transport(format!("cannot use scheme {}", scheme)))?;

    let path = format!("{}/ws", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

impl LiveSession {
    /// Start connecting to `endpoint` with the default options
    pub fn connect(endpoint: &str, token: &str) -> Result<Self> {
        Self::connect_with(endpoint, token, SessionOptions::default())
    }

    /// Start connecting to `endpoint`
    pub fn connect_with(endpoint: &str, token: &str, options: SessionOptions) -> Result<Self> {
        let url = session_url(endpoint, token)?;
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let (view, _) = watch::channel(DiagnosticsView::default());
        let state = Arc::new(state);
        let view = Arc::new(view);
        let tracker = Arc::new(Mutex::new(ResultTracker::new()));
        let close_signal = Arc::new(Notify::new());
        let (outbound, rx) = mpsc::channel(options.queue_capacity.max(1));

        let task = tokio::spawn(run(
            url,
            Arc::clone(&state),
            Arc::clone(&view),
            Arc::clone(&tracker),
            Arc::clone(&close_signal),
            rx,
        ));

        Ok(Self {
            state,
            view,
            tracker,
            outbound,
            close_signal,
            options,
            task,
        })
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Whether requests may be sent
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current view
    pub fn view(&self) -> DiagnosticsView {
        self.view.borrow().clone()
    }

    /// Watch view replacements
    pub fn subscribe_view(&self) -> watch::Receiver<DiagnosticsView> {
        self.view.subscribe()
    }

    /// Wait until the handshake settles; `true` if the session is open
    pub async fn wait_open(&self) -> bool {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state != ConnectionState::Connecting).await {
            Ok(state) => state.is_open(),
            Err(_) => false,
        }
    }

    /// Wait until the session is closed
    pub async fn closed(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| state.is_closed()).await;
    }

    /// Whether the background connection task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Send an analyze request, returning its sequence number.
    ///
    /// Dropped with a warning, returning `None`, when the session is not
    /// open or the outbound queue is full. Nothing is buffered for later.
    pub fn send_analyze(&self, language: &str, code: &str) -> Option<u64> {
        let state = self.state();
        if !state.is_open() {
            log::warn!("Dropping analyze request: session is {}", state);
            return None;
        }

        let mut tracker = lock(&self.tracker);
        let seq = tracker.upcoming();
        let frame = match ClientMessage::analyze(language, code, Some(seq)).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Dropping analyze request: {}", e);
                return None;
            }
        };

        if let Err(e) = self.outbound.try_send(frame) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    log::warn!("Dropping analyze request: outbound queue full")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    log::warn!("Dropping analyze request: session task stopped")
                }
            }
            return None;
        }
        tracker.record_sent(seq);
        drop(tracker);

        if let Some(timeout) = self.options.response_timeout {
            let tracker = Arc::clone(&self.tracker);
            let view = Arc::clone(&self.view);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if lock(&tracker).is_awaiting(seq) {
                    log::warn!("No result for request {} after {}ms", seq, timeout.as_millis());
                    view.send_modify(DiagnosticsView::mark_stale);
                }
            });
        }

        log::debug!("Sent analyze request {} ({}, {} bytes)", seq, language, code.len());
        Some(seq)
    }

    /// Close the session. Idempotent.
    pub fn close(&self) {
        self.state.send_replace(ConnectionState::Closed);
        self.close_signal.notify_one();
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("state", &self.state())
            .field("options", &self.options)
            .finish()
    }
}

fn lock(tracker: &Mutex<ResultTracker>) -> MutexGuard<'_, ResultTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run(
    url: Url,
    state: Arc<watch::Sender<ConnectionState>>,
    view: Arc<watch::Sender<DiagnosticsView>>,
    tracker: Arc<Mutex<ResultTracker>>,
    close_signal: Arc<Notify>,
    mut outbound: mpsc::Receiver<String>,
) {
    let host = url.host_str().unwrap_or("").to_string();
    let handshake = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
        _ = close_signal.notified() => {
            log::debug!("Session to {} closed before handshake finished", host);
            state.send_replace(ConnectionState::Closed);
            return;
        }
    };

    let socket = match handshake {
        Ok((socket, _)) => socket,
        Err(e) => {
            log::warn!("Connection to {} failed: {}", host, e);
            state.send_replace(ConnectionState::Closed);
            return;
        }
    };

    // close() may have raced the handshake
    if !state.send_if_modified(|current| {
        if *current == ConnectionState::Connecting {
            *current = ConnectionState::Open;
            true
        } else {
            false
        }
    }) {
        return;
    }
    log::info!("Connected to {}", host);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        log::warn!("Send to {} failed: {}", host, e);
                        break;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => on_frame(text.as_str(), &tracker, &view),
                Some(Ok(Message::Close(_))) | None => {
                    log::info!("Server {} closed the connection", host);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("Connection to {} lost: {}", host, e);
                    break;
                }
            },
            _ = close_signal.notified() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.send_replace(ConnectionState::Closed);
}

fn on_frame(text: &str, tracker: &Mutex<ResultTracker>, view: &watch::Sender<DiagnosticsView>) {
    let message = match ServerMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Ignoring malformed server frame: {}", e);
            return;
        }
    };

    let seq = message.seq();
    if !lock(tracker).accept(seq) {
        log::debug!("Discarding stale result {:?}", seq);
        return;
    }
    view.send_replace(DiagnosticsView::from_result(message.into_result(), seq));
}
