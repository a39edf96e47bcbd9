//! One live session socket

use super::AppState;
use super::ratelimit::RATE_LIMIT_MESSAGE;
use crate::protocol::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Outbound frames buffered per connection
const OUTBOUND_CAPACITY: usize = 32;

struct ConnectionGuard<'a> {
    state: &'a AppState,
    user_id: &'a str,
}

impl<'a> ConnectionGuard<'a> {
    fn open(state: &'a AppState, user_id: &'a str) -> Self {
        let active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
        state.metrics.connection_opened();
        log::info!("Connection opened for {} ({} active)", user_id, active);
        Self { state, user_id }
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        let active = self.state.active.fetch_sub(1, Ordering::SeqCst) - 1;
        self.state.metrics.connection_closed();
        log::info!("Connection closed for {} ({} active)", self.user_id, active);
    }
}

struct Connection {
    state: AppState,
    user_id: String,
    outbound: mpsc::Sender<ServerMessage>,
    in_flight: Option<AbortHandle>,
}

impl Connection {
    async fn on_text(&mut self, text: &str) {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Ignoring malformed frame from {}: {}", self.user_id, e);
                return;
            }
        };

        let seq = message.seq;
        let request = match message.into_request() {
            Ok(request) => request,
            Err(rejection) => {
                self.reply(ServerMessage::error(rejection.to_string(), seq)).await;
                return;
            }
        };

        if !self.state.limiter.check(&self.user_id) {
            log::warn!("Rate limit exceeded for {}", self.user_id);
            self.reply(ServerMessage::error(RATE_LIMIT_MESSAGE, seq)).await;
            return;
        }

        if let Some(previous) = self.in_flight.take()
            && !previous.is_finished()
        {
            log::debug!("Superseding in-flight analysis for {}", self.user_id);
            previous.abort();
        }

        log::info!(
            "Analysis request from {} for {} (seq {:?})",
            self.user_id,
            request.language,
            seq
        );
        let dispatcher = self.state.dispatcher.clone();
        let metrics = self.state.metrics.clone();
        let outbound = self.outbound.clone();
        let task = tokio::spawn(async move {
            let start = Instant::now();
            let result = dispatcher.dispatch(&request).await;
            metrics.observe_analysis(&request.language, &result, start.elapsed());
            let _ = outbound.send(ServerMessage::from_result(result, seq)).await;
        });
        self.in_flight = Some(task.abort_handle());
    }

    async fn reply(&self, message: ServerMessage) {
        if self.outbound.send(message).await.is_err() {
            log::debug!("Writer for {} already stopped", self.user_id);
        }
    }
}

/// Drive a socket until the peer goes away
pub(crate) async fn handle_socket(socket: WebSocket, state: AppState, user_id: String) {
    let _guard = ConnectionGuard::open(&state, &user_id);
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);

    let writer_user = user_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Failed to encode response for {}: {}", writer_user, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                log::debug!("Send to {} failed: {}", writer_user, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut connection = Connection {
        state: state.clone(),
        user_id: user_id.clone(),
        outbound,
        in_flight: None,
    };

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => connection.on_text(text.as_str()).await,
            Ok(Message::Binary(_)) => {
                log::warn!("Ignoring binary frame from {}", user_id);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("WebSocket error for {}: {}", user_id, e);
                break;
            }
        }
    }

    if let Some(task) = connection.in_flight.take() {
        task.abort();
    }
    drop(connection);
    let _ = writer.await;
}
