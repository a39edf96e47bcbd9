//! CLI entry point: module declarations and the `run()` dispatcher

mod analyze;
mod args;
mod watch;

use anyhow::anyhow;
use args::{Args, Command};
use clap::Parser;
use colored::Colorize;
use livelint::client::sample;
use livelint::{AnalyzerRegistry, Language, ServerConfig};
use std::path::Path;
use std::process::ExitCode;

/// Main CLI entry point: parse args and dispatch to the appropriate handler
pub async fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Analyze {
            file,
            language,
            output_format,
            mock,
            timeout_ms,
            quiet,
        } => {
            let mut analysis = config.analysis;
            analysis.mock |= mock;
            if let Some(timeout_ms) = timeout_ms {
                analysis.timeout_ms = timeout_ms;
            }
            let language = language_for(&file, language.as_deref())?;
            analyze::analyze_file(&file, &language, &analysis, output_format, quiet).await
        }
        Command::Watch {
            file,
            server,
            token,
            language,
            quiet_period_ms,
            response_timeout_ms,
            once,
        } => {
            let language: Language = language_for(&file, language.as_deref())?.parse()?;
            let options = watch::WatchOptions {
                server,
                token,
                language,
                quiet_period: std::time::Duration::from_millis(quiet_period_ms),
                response_timeout: response_timeout_ms.map(std::time::Duration::from_millis),
                once,
            };
            watch::run_watch(&file, options).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Languages => {
            list_languages(&config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Samples { language } => {
            print_samples(language.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Explicit file, else discovered file, else defaults; env overrides on top
fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => std::env::current_dir()
            .ok()
            .and_then(ServerConfig::discover)
            .unwrap_or_default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Language identifier from `--language` or the file extension
fn language_for(file: &Path, explicit: Option<&str>) -> anyhow::Result<String> {
    if let Some(language) = explicit {
        return Ok(language.to_string());
    }
    file.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension)
        .map(|language| language.id().to_string())
        .ok_or_else(|| {
            anyhow!(
                "cannot infer the language of {}; pass --language",
                file.display()
            )
        })
}

fn list_languages(config: &ServerConfig) {
    let registry = AnalyzerRegistry::from_config(&config.analysis);
    let mode = if config.analysis.mock { " (mock)" } else { "" };

    for language in Language::ALL {
        let status = if registry.get(language).is_some() {
            format!("enabled{}", mode).green()
        } else {
            "disabled".dimmed()
        };
        println!(
            "{:<12} .{:<6} {}",
            language.id().bold(),
            language.extension(),
            status
        );
    }
}

fn print_samples(language: Option<&str>) -> anyhow::Result<()> {
    let languages = match language {
        Some(id) => vec![id.parse::<Language>()?],
        None => Language::ALL.to_vec(),
    };

    for (i, language) in languages.iter().enumerate() {
        if languages.len() > 1 {
            if i > 0 {
                println!();
            }
            println!("{}", format!("// {}", language).cyan().bold());
        }
        println!("{}", sample(*language));
    }
    Ok(())
}
