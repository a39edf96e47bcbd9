//! Core type definitions shared by analyzers, the dispatcher and clients

mod diagnostic;
mod error;
mod language;
mod results;

pub use diagnostic::*;
pub use error::*;
pub use language::*;
pub use results::*;
