//! CLI argument definitions for livelint

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "livelint")]
#[command(about = "Live static analysis for TypeScript, Python, Go, Dart and C++", long_about = None)]
#[command(version)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Path to configuration file (default: discovered from the current directory)
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Analyze a file once with the locally installed toolchain
    Analyze {
        /// Source file to analyze
        file: PathBuf,

        /// Language identifier (default: inferred from the file extension)
        #[arg(short, long)]
        language: Option<String>,

        /// Output format
        #[arg(short = 'o', long, default_value = "text")]
        output_format: OutputFormat,

        /// Use the canned mock analyzer instead of real tools
        #[arg(long)]
        mock: bool,

        /// Analyzer timeout in milliseconds (0 disables)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Only print diagnostics, no summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Stream a file to a livelint server and re-analyze it on every save
    Watch {
        /// Source file to watch
        file: PathBuf,

        /// Server endpoint (ws://, wss://, http:// or https://)
        #[arg(long, env = "LIVELINT_SERVER", default_value = "ws://localhost:8080")]
        server: String,

        /// Session token
        #[arg(long, env = "LIVELINT_TOKEN")]
        token: String,

        /// Language identifier (default: inferred from the file extension)
        #[arg(short, long)]
        language: Option<String>,

        /// Quiet period before an edit is sent, in milliseconds
        #[arg(long, default_value_t = 300)]
        quiet_period_ms: u64,

        /// Flag results as stale when no answer arrives within this many milliseconds
        #[arg(long)]
        response_timeout_ms: Option<u64>,

        /// Exit after the first result
        #[arg(long)]
        once: bool,
    },

    /// List supported languages and whether an analyzer is configured
    Languages,

    /// Print the starter sample for a language (all languages if omitted)
    Samples {
        /// Language identifier
        language: Option<String>,
    },
}
