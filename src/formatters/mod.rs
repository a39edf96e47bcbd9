//! Output formatters for analysis results

mod json;
mod text;

pub use json::format_json;
pub use text::{format_text, format_text_with_context};
