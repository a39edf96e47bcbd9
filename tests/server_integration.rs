#![cfg(all(feature = "server", feature = "client"))]

//! End-to-end tests for the live session server over a real socket

use futures_util::{SinkExt, StreamExt};
use livelint::analyzers::AnalyzeFuture;
use livelint::client::LiveSession;
use livelint::config::RateLimitConfig;
use livelint::protocol::ServerMessage;
use livelint::server::ratelimit::RATE_LIMIT_MESSAGE;
use livelint::server::{AppState, MockTokenVerifier, StaticTokenVerifier, serve};
use livelint::{Analyzer, AnalyzerRegistry, Diagnostic, Dispatcher, Language, Severity};
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TOKEN: &str = "dev-token";

/// Python analyzer that takes half a second for code containing "slow"
struct Sluggish;

impl Analyzer for Sluggish {
    fn language(&self) -> Language {
        Language::Python
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move {
            if code.contains("slow") {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok(vec![Diagnostic::new(
                1,
                1,
                code.len(),
                format!("saw {}", code),
                Severity::Info,
            )])
        })
    }
}

fn mock_state(rate_limit: RateLimitConfig) -> AppState {
    let dispatcher = Dispatcher::from_config(&livelint::config::AnalysisConfig {
        mock: true,
        ..Default::default()
    });
    let verifier = Arc::new(StaticTokenVerifier::default().with_token(TOKEN, "developer"));
    AppState::new(dispatcher, verifier, &rate_limit).unwrap()
}

async fn start(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state, std::future::pending()));
    addr
}

async fn open_socket(addr: SocketAddr, token: &str) -> Socket {
    let url = format!("ws://{}/ws?token={}", addr, token);
    let (socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: &str) {
    socket.send(Message::Text(frame.into())).await.unwrap();
}

async fn next_reply(socket: &mut Socket) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("reply within 5s")
            .expect("socket still open")
            .unwrap();
        if let Message::Text(text) = frame {
            return ServerMessage::parse(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_health_reports_active_connections() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let health_url = format!("http://{}/health", addr);

    let body: serde_json::Value = reqwest::get(&health_url).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_connections"], 0);
    assert!(body["timestamp"].is_string());

    let _socket = open_socket(addr, TOKEN).await;
    let mut active = 0;
    for _ in 0..50 {
        let body: serde_json::Value =
            reqwest::get(&health_url).await.unwrap().json().await.unwrap();
        active = body["active_connections"].as_u64().unwrap();
        if active == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_upgrade_without_valid_token_is_unauthorized() {
    let addr = start(mock_state(RateLimitConfig::default())).await;

    let missing = reqwest::get(format!("http://{}/ws", addr)).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(missing.text().await.unwrap(), "Missing auth token");

    let invalid = reqwest::get(format!("http://{}/ws?token=nope", addr))
        .await
        .unwrap();
    assert_eq!(invalid.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.text().await.unwrap(), "Invalid auth token");

    let url = format!("ws://{}/ws?token=nope", addr);
    assert!(tokio_tungstenite::connect_async(url).await.is_err());
}

#[tokio::test]
async fn test_analyze_round_trip_echoes_seq() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let mut socket = open_socket(addr, TOKEN).await;

    send(
        &mut socket,
        r#"{"action":"analyze","language":"python","code":"print(1)","seq":7}"#,
    )
    .await;

    match next_reply(&mut socket).await {
        ServerMessage::AnalysisResult { errors, seq, .. } => {
            assert_eq!(seq, Some(7));
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message(), "Mock error for python (testing mode)");
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_metrics_record_analyses_and_sockets() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let mut socket = open_socket(addr, TOKEN).await;

    send(
        &mut socket,
        r#"{"action":"analyze","language":"golang","code":"package main","seq":1}"#,
    )
    .await;
    next_reply(&mut socket).await;

    let response = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(
        body.contains(r#"livelint_analyses_total{language="go",outcome="ok"} 1"#),
        "{}",
        body
    );
    assert!(body.contains("livelint_websocket_connections 1"));
    assert!(body.contains(r#"http_requests_total{endpoint="/ws",method="GET",status="101"} 1"#));
}

#[tokio::test]
async fn test_empty_code_gets_no_code_diagnostic() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let mut socket = open_socket(addr, TOKEN).await;

    send(&mut socket, r#"{"action":"analyze","language":"go"}"#).await;

    assert_eq!(
        next_reply(&mut socket).await,
        ServerMessage::AnalysisResult {
            errors: vec![Diagnostic::no_code()],
            execution_time_ms: 0,
            seq: None,
        }
    );
}

#[tokio::test]
async fn test_invalid_requests_get_error_replies() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let mut socket = open_socket(addr, TOKEN).await;

    send(
        &mut socket,
        r#"{"action":"format","language":"python","code":"x","seq":1}"#,
    )
    .await;
    assert_eq!(
        next_reply(&mut socket).await,
        ServerMessage::error("Unknown action: format", Some(1))
    );

    send(&mut socket, r#"{"action":"analyze","code":"x","seq":2}"#).await;
    assert_eq!(
        next_reply(&mut socket).await,
        ServerMessage::error("Missing language field", Some(2))
    );

    send(
        &mut socket,
        r#"{"action":"analyze","language":"cobol","code":"x","seq":3}"#,
    )
    .await;
    assert_eq!(
        next_reply(&mut socket).await,
        ServerMessage::error("Unsupported language: cobol", Some(3))
    );
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let mut socket = open_socket(addr, TOKEN).await;

    send(&mut socket, "this is not json").await;
    socket
        .send(Message::Binary(vec![1, 2, 3].into()))
        .await
        .unwrap();
    send(
        &mut socket,
        r#"{"action":"analyze","language":"dart","code":"void main() {}","seq":4}"#,
    )
    .await;

    assert_eq!(next_reply(&mut socket).await.seq(), Some(4));
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let addr = start(mock_state(RateLimitConfig {
        requests: 2,
        window_secs: 60,
    }))
    .await;
    let mut socket = open_socket(addr, TOKEN).await;

    for seq in 1..=2 {
        let frame = format!(
            r#"{{"action":"analyze","language":"go","code":"package main","seq":{}}}"#,
            seq
        );
        send(&mut socket, &frame).await;
        assert!(matches!(
            next_reply(&mut socket).await,
            ServerMessage::AnalysisResult { .. }
        ));
    }

    send(
        &mut socket,
        r#"{"action":"analyze","language":"go","code":"package main","seq":3}"#,
    )
    .await;
    assert_eq!(
        next_reply(&mut socket).await,
        ServerMessage::error(RATE_LIMIT_MESSAGE, Some(3))
    );

    // the limit is per user, not per socket
    let mut second = open_socket(addr, TOKEN).await;
    send(
        &mut second,
        r#"{"action":"analyze","language":"go","code":"package main","seq":1}"#,
    )
    .await;
    assert_eq!(
        next_reply(&mut second).await,
        ServerMessage::error(RATE_LIMIT_MESSAGE, Some(1))
    );
}

#[tokio::test]
async fn test_newer_request_supersedes_in_flight_one() {
    let registry = AnalyzerRegistry::new().with(Arc::new(Sluggish));
    let state = AppState::new(
        Dispatcher::new(Arc::new(registry)),
        Arc::new(MockTokenVerifier),
        &RateLimitConfig::default(),
    )
    .unwrap();
    let addr = start(state).await;
    let mut socket = open_socket(addr, "anything").await;

    send(
        &mut socket,
        r#"{"action":"analyze","language":"python","code":"slow","seq":1}"#,
    )
    .await;
    send(
        &mut socket,
        r#"{"action":"analyze","language":"python","code":"fast","seq":2}"#,
    )
    .await;

    let reply = next_reply(&mut socket).await;
    assert_eq!(reply.seq(), Some(2));

    let late = tokio::time::timeout(Duration::from_millis(800), socket.next()).await;
    assert!(late.is_err(), "superseded request must not be answered");
}

#[tokio::test]
async fn test_live_session_shows_latest_result() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let session = LiveSession::connect(&format!("http://{}", addr), TOKEN).unwrap();
    assert!(session.wait_open().await);

    let seq = session.send_analyze("typescript", "let x = 1;").unwrap();
    let mut views = session.subscribe_view();
    let view = tokio::time::timeout(
        Duration::from_secs(5),
        views.wait_for(|view| view.seq() == Some(seq)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert!(!view.is_stale());
    assert_eq!(view.error(), None);
    assert_eq!(view.warning_count(), 1);
    assert_eq!(
        view.diagnostics()[0].message(),
        "Mock error for typescript (testing mode)"
    );

    session.close();
    session.closed().await;
    assert!(!session.is_open());
    assert_eq!(session.send_analyze("typescript", "let y = 2;"), None);
}

#[tokio::test]
async fn test_live_session_with_bad_token_never_opens() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let session = LiveSession::connect(&format!("ws://{}", addr), "wrong").unwrap();

    assert!(!session.wait_open().await);
    assert!(session.state().is_closed());
    assert_eq!(session.send_analyze("python", "x = 1"), None);
}

#[tokio::test]
async fn test_live_session_reports_error_results() {
    let addr = start(mock_state(RateLimitConfig::default())).await;
    let session = LiveSession::connect(&format!("ws://{}", addr), TOKEN).unwrap();
    assert!(session.wait_open().await);

    let seq = session.send_analyze("cobol", "DISPLAY 'HI'.").unwrap();
    let mut views = session.subscribe_view();
    let view = tokio::time::timeout(
        Duration::from_secs(5),
        views.wait_for(|view| view.seq() == Some(seq)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(view.error(), Some("Unsupported language: cobol"));
    assert_eq!(view.error_count(), 1);
}
