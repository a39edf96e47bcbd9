//! `analyze`: run the local dispatcher over one file

use super::args::OutputFormat;
use anyhow::Context;
use colored::Colorize;
use livelint::config::AnalysisConfig;
use livelint::{AnalysisResult, AnalyzeRequest, Dispatcher, formatters};
use std::path::Path;
use std::process::ExitCode;

/// Analyze `file` once; exit code 1 when it has errors or could not be analyzed
pub(crate) async fn analyze_file(
    file: &Path,
    language: &str,
    analysis: &AnalysisConfig,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let dispatcher = Dispatcher::from_config(analysis);
    let result = dispatcher
        .dispatch(&AnalyzeRequest::new(language, code.as_str()))
        .await;
    let path = file.display().to_string();

    match format {
        OutputFormat::Json => println!("{}", formatters::format_json(&path, language, &result)),
        OutputFormat::Text => {
            let output = formatters::format_text_with_context(&path, &code, &result);
            print!("{}", output);
            if !quiet {
                print_summary(&result);
            }
        }
    }

    let failed = !result.is_ok() || result.error_count() > 0;
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub(crate) fn print_summary(result: &AnalysisResult) {
    let AnalysisResult::Ok { diagnostics, .. } = result else {
        return;
    };
    let elapsed = result.execution_time_ms().unwrap_or(0);

    if diagnostics.is_empty() {
        println!("{} No problems found ({}ms)", "✓".green().bold(), elapsed);
        return;
    }

    let errors = result.error_count();
    let warnings = result.warning_count();
    let infos = diagnostics.len() - errors - warnings;
    let marker = if errors > 0 {
        "✗".red().bold()
    } else {
        "!".yellow().bold()
    };
    println!(
        "{} {} error(s), {} warning(s), {} info ({}ms)",
        marker,
        errors.to_string().red(),
        warnings.to_string().yellow(),
        infos,
        elapsed
    );
}
