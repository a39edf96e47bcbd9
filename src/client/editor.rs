//! Editor state: selected language plus current text

use super::debounce::{AnalyzeSink, EditDebouncer};
use crate::types::Language;
use std::sync::Arc;
use std::time::Duration;

/// Starter text shown when a language is selected
pub fn sample(language: Language) -> &'static str {
    match language {
        Language::Typescript => "const x: number = 'hello';\nconst y = 42;\nconsole.log(x + y);",
        Language::Python => "def greet(name)\n    print(f\"Hello, {name}\")",
        Language::Go => "package main\n\nfunc main {\n    fmt.Println(\"Hello\")\n}",
        Language::Dart => "void main() {\n  var x: int = \"hello\";\n  print(x);\n}",
        Language::Cpp => "#include <iostream>\n\nint main {\n    std::cout << \"Hello\";\n    return 0;\n}",
    }
}

/// Text being edited, wired to a debounced sink
pub struct Editor<S: AnalyzeSink> {
    language: Language,
    code: String,
    debouncer: EditDebouncer<S>,
}

impl<S: AnalyzeSink> Editor<S> {
    /// Open an editor on `language` with its sample loaded
    pub fn new(sink: Arc<S>, language: Language, quiet_period: Duration) -> Self {
        Self {
            language,
            code: sample(language).to_string(),
            debouncer: EditDebouncer::new(sink, quiet_period),
        }
    }

    /// Selected language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Current text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Replace the text
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.changed();
    }

    /// Switch language; the text is reset to that language's sample
    pub fn select_language(&mut self, language: Language) {
        self.language = language;
        self.code = sample(language).to_string();
        self.changed();
    }

    /// Schedule analysis of the current state without editing it
    pub fn touch(&self) {
        self.changed();
    }

    /// Underlying debouncer
    pub fn debouncer(&self) -> &EditDebouncer<S> {
        &self.debouncer
    }

    fn changed(&self) {
        self.debouncer.on_change(self.language, self.code.clone());
    }
}
