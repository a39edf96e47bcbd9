//! TypeScript analyzer backed by the TypeScript compiler API

use super::position::{locate_utf16_offset, utf16_span_chars};
use super::process::Tool;
use super::{AnalyzeFuture, Analyzer, ScratchDir};
use crate::config::TypeScriptConfig;
use crate::types::{AnalyzerError, Diagnostic, Language, Severity};
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Node.js driver. Prints a JSON array of diagnostics for the file given as
/// its first argument. Exits 3 when the `typescript` package is missing.
const CHECK_SCRIPT: &str = r#"
let ts;
try {
  ts = require('typescript');
} catch (e) {
  process.stderr.write('cannot load typescript: ' + e.message + '\n');
  process.exit(3);
}
const file = process.argv[2];
const program = ts.createProgram([file], {
  noEmit: true,
  target: ts.ScriptTarget.ES2015,
  module: ts.ModuleKind.CommonJS,
  strict: true,
  esModuleInterop: true,
  skipLibCheck: true,
});
const source = program.getSourceFile(file);
const diagnostics = [
  ...program.getSyntacticDiagnostics(),
  ...program.getSemanticDiagnostics(),
];
// assignability errors are reported on the declared name; point at the value
const ASSIGNABILITY = new Set([2322, 2375, 2741]);
function innermost(node, pos) {
  let found = node;
  ts.forEachChild(node, (child) => {
    if (pos >= child.getStart(source) && pos < child.getEnd()) {
      found = innermost(child, pos);
    }
  });
  return found;
}
function span(d) {
  if (d.file !== source || d.start === undefined) {
    return { start: null, length: 1 };
  }
  if (ASSIGNABILITY.has(d.code)) {
    const node = innermost(source, d.start);
    const decl = node.parent;
    if (
      decl &&
      (ts.isVariableDeclaration(decl) || ts.isPropertyDeclaration(decl) || ts.isParameter(decl)) &&
      decl.name === node &&
      decl.initializer
    ) {
      return {
        start: decl.initializer.getStart(source),
        length: decl.initializer.getWidth(source) || 1,
      };
    }
  }
  return { start: d.start, length: d.length || 1 };
}
const out = diagnostics.map((d) => ({
  ...span(d),
  category: ts.DiagnosticCategory[d.category],
  code: d.code,
  message: ts.flattenDiagnosticMessageText(d.messageText, '\n'),
}));
process.stdout.write(JSON.stringify(out));
"#;

const TOOL: &str = "typescript";

/// One diagnostic as emitted by the driver script
#[derive(Debug, Deserialize)]
struct TsDiagnostic {
    /// Absolute UTF-16 offset into the checked file
    start: Option<usize>,
    /// Span length in UTF-16 units
    length: usize,
    category: String,
    message: String,
}

/// Analyzer for TypeScript
#[derive(Debug, Clone)]
pub struct TypeScriptAnalyzer {
    config: TypeScriptConfig,
    global_modules: OnceCell<Option<String>>,
}

impl TypeScriptAnalyzer {
    /// Create a new TypeScript analyzer
    pub fn new(config: TypeScriptConfig) -> Self {
        Self {
            config,
            global_modules: OnceCell::new(),
        }
    }

    /// `NODE_PATH` for the driver.
    ///
    /// The configured path wins. Without one, an inherited `NODE_PATH` is
    /// left alone; otherwise the global `node_modules` reported by npm is
    /// used, looked up once per analyzer.
    async fn node_path(&self) -> Option<&str> {
        if let Some(path) = &self.config.node_path {
            return Some(path.as_str());
        }
        if std::env::var_os("NODE_PATH").is_some() {
            return None;
        }
        self.global_modules
            .get_or_init(|| global_node_modules(&self.config.npm))
            .await
            .as_deref()
    }

    async fn run(&self, code: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let scratch = ScratchDir::new("ts")?;
        let script = scratch.write("check.js", CHECK_SCRIPT).await?;
        let source = scratch.write("main.ts", code).await?;

        let mut tool = Tool::new(&self.config.node)
            .arg(script)
            .arg(source)
            .current_dir(scratch.path());
        if let Some(node_path) = self.node_path().await {
            tool = tool.env("NODE_PATH", node_path);
        }

        let output = tool.run().await?;
        if !output.status.success() {
            return Err(output.failure(tool.program()));
        }

        parse_output(code, &output.stdout)
    }
}

impl Analyzer for TypeScriptAnalyzer {
    fn language(&self) -> Language {
        Language::Typescript
    }

    fn analyze<'a>(&'a self, code: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(self.run(code))
    }
}

/// Ask npm where global packages live
async fn global_node_modules(npm: &str) -> Option<String> {
    match Tool::new(npm).args(["root", "-g"]).run().await {
        Ok(output) if output.status.success() => {
            let root = output.stdout.trim();
            log::debug!("Global node modules: {}", root);
            (!root.is_empty()).then(|| root.to_string())
        }
        Ok(output) => {
            log::warn!("{} root -g exited with {}", npm, output.status);
            None
        }
        Err(e) => {
            log::warn!("Could not locate global node modules: {}", e);
            None
        }
    }
}

/// Map a `ts.DiagnosticCategory` name onto a severity
pub fn category_severity(category: &str) -> Severity {
    match category {
        "Error" => Severity::Error,
        "Warning" => Severity::Warning,
        "Suggestion" | "Message" => Severity::Info,
        _ => Severity::Warning,
    }
}

/// Convert the driver's JSON output into diagnostics
pub fn parse_output(code: &str, stdout: &str) -> Result<Vec<Diagnostic>, AnalyzerError> {
    let raw: Vec<TsDiagnostic> =
        serde_json::from_str(stdout.trim()).map_err(|e| AnalyzerError::MalformedOutput {
            tool: TOOL.to_string(),
            detail: e.to_string(),
        })?;

    Ok(raw
        .into_iter()
        .map(|d| {
            let severity = category_severity(&d.category);
            match d.start {
                Some(start) => {
                    let (line, column) = locate_utf16_offset(code, start);
                    let length = utf16_span_chars(code, start, d.length);
                    Diagnostic::new(line, column, length, d.message, severity)
                }
                None => Diagnostic::unlocated(d.message, severity),
            }
        })
        .collect())
}
