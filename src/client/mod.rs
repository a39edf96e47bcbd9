//! Client side of the live analysis pipeline
//!
//! [`LiveSession`] owns the socket, [`EditDebouncer`] turns edits into
//! requests, and [`DiagnosticsView`] holds what an editor should display.
//!
//! ```no_run
//! # async fn demo() -> livelint::Result<()> {
//! use livelint::client::{Editor, LiveSession};
//! use livelint::Language;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let session = Arc::new(LiveSession::connect("ws://localhost:8080", "token")?);
//! session.wait_open().await;
//!
//! let mut editor = Editor::new(Arc::clone(&session), Language::Python, Duration::from_millis(300));
//! editor.set_code("print('hi')");
//!
//! let mut view = session.subscribe_view();
//! view.changed().await.ok();
//! println!("{} diagnostics", view.borrow().diagnostics().len());
//! # Ok(())
//! # }
//! ```

pub mod debounce;
mod editor;
mod session;
mod state;
mod view;

pub use debounce::{AnalyzeSink, DEFAULT_QUIET_PERIOD, EditDebouncer};
pub use editor::{Editor, sample};
pub use session::{LiveSession, ResultTracker, SessionOptions, session_url};
pub use state::ConnectionState;
pub use view::DiagnosticsView;
