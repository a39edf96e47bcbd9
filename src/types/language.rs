//! Supported language identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language with an analyzer behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// TypeScript
    Typescript,
    /// Python 3
    Python,
    /// Go
    Go,
    /// Dart
    Dart,
    /// C++
    Cpp,
}

impl Language {
    /// Every supported language, in menu order
    pub const ALL: [Language; 5] = [
        Language::Typescript,
        Language::Python,
        Language::Go,
        Language::Dart,
        Language::Cpp,
    ];

    /// Wire identifier
    pub fn id(self) -> &'static str {
        match self {
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Dart => "dart",
            Language::Cpp => "cpp",
        }
    }

    /// Source file extension used for scratch files
    pub fn extension(self) -> &'static str {
        match self {
            Language::Typescript => "ts",
            Language::Python => "py",
            Language::Go => "go",
            Language::Dart => "dart",
            Language::Cpp => "cpp",
        }
    }

    /// Guess the language from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "tsx" | "mts" | "cts" => Some(Language::Typescript),
            "py" | "pyi" => Some(Language::Python),
            "go" => Some(Language::Go),
            "dart" => Some(Language::Dart),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown language identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typescript" => Ok(Language::Typescript),
            "python" => Ok(Language::Python),
            "go" | "golang" => Ok(Language::Go),
            "dart" => Ok(Language::Dart),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
