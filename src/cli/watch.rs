//! `watch`: stream a file to a server, re-analyzing on every save

use colored::Colorize;
use livelint::client::{DiagnosticsView, Editor, LiveSession, SessionOptions};
use livelint::{AnalysisResult, Language, formatters};
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub(crate) struct WatchOptions {
    pub(crate) server: String,
    pub(crate) token: String,
    pub(crate) language: Language,
    pub(crate) quiet_period: Duration,
    pub(crate) response_timeout: Option<Duration>,
    pub(crate) once: bool,
}

enum SessionEnd {
    Finished,
    Disconnected,
}

/// Run watch mode until Ctrl-C (or the first result with `--once`)
pub(crate) async fn run_watch(file: &Path, options: WatchOptions) -> anyhow::Result<()> {
    let file = std::fs::canonicalize(file)?;
    let dir = file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // editors often save by renaming, so watch the directory
    let (tx, mut events) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    println!("{} Watching: {}", "✓".green(), file.display().to_string().cyan());
    println!("{} Press {} to exit", "▸".cyan(), "Ctrl+C".yellow().bold());

    let mut backoff = INITIAL_BACKOFF;
    loop {
        println!("{} Connecting to {}...", "▸".cyan(), options.server);
        let session_options = SessionOptions {
            response_timeout: options.response_timeout,
            ..Default::default()
        };
        let session = Arc::new(LiveSession::connect_with(
            &options.server,
            &options.token,
            session_options,
        )?);

        if !session.wait_open().await {
            eprintln!(
                "{} Connection failed; retrying in {}ms",
                "Warning:".yellow().bold(),
                backoff.as_millis()
            );
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
            continue;
        }
        backoff = INITIAL_BACKOFF;
        println!("{} Connected", "✓".green());

        match watch_session(&file, &options, Arc::clone(&session), &mut events).await? {
            SessionEnd::Finished => {
                session.close();
                return Ok(());
            }
            SessionEnd::Disconnected => {
                eprintln!("{} Connection closed; reconnecting", "Warning:".yellow().bold());
            }
        }
    }
}

async fn watch_session(
    file: &Path,
    options: &WatchOptions,
    session: Arc<LiveSession>,
    events: &mut mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
) -> anyhow::Result<SessionEnd> {
    let mut editor = Editor::new(Arc::clone(&session), options.language, options.quiet_period);
    let mut views = session.subscribe_view();
    let mut state = session.subscribe_state();

    editor.set_code(tokio::fs::read_to_string(file).await?);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Ok(event)) if is_relevant(&event, file) => {
                    match tokio::fs::read_to_string(file).await {
                        Ok(code) if code != editor.code() => editor.set_code(code),
                        Ok(_) => {}
                        Err(e) => log::debug!("Skipping unreadable {}: {}", file.display(), e),
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => eprintln!("{} Watch error: {}", "Error:".red().bold(), e),
                None => return Ok(SessionEnd::Finished),
            },
            changed = views.changed() => {
                if changed.is_err() {
                    return Ok(SessionEnd::Disconnected);
                }
                let view = views.borrow_and_update().clone();
                print_view(file, editor.code(), &view);
                if options.once && !view.is_stale() {
                    return Ok(SessionEnd::Finished);
                }
            },
            _ = state.wait_for(|s| s.is_closed()) => return Ok(SessionEnd::Disconnected),
            _ = tokio::signal::ctrl_c() => return Ok(SessionEnd::Finished),
        }
    }
}

fn is_relevant(event: &notify::Event, file: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_)
    ) && event.paths.iter().any(|p| p == file)
}

fn print_view(file: &Path, code: &str, view: &DiagnosticsView) {
    let path = file.display().to_string();
    if view.is_stale() {
        println!("{} Waiting for a result (previous shown below may be outdated)", "…".yellow());
        return;
    }

    let result = match view.error() {
        Some(message) => AnalysisResult::error(message),
        None => AnalysisResult::ok(
            view.diagnostics().to_vec(),
            Duration::from_millis(view.execution_time_ms().unwrap_or(0)),
        ),
    };
    println!();
    print!("{}", formatters::format_text_with_context(&path, code, &result));
    super::analyze::print_summary(&result);
}
