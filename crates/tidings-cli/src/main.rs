#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, CodedError, OutputMode, render_error, resolve_output_mode};
use tidings_core::error::ErrorCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "td: replay a notification history into an activity timeline",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json, FORMAT and config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Config file to use instead of the user config.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Build the activity timeline",
        long_about = "Page the fixture's message history into activities until enough are \
                      loaded, then apply the optional live stream and print the timeline.",
        after_help = "EXAMPLES:\n    # Replay a recorded history\n    td replay --fixture history.json\n\n    # Apply a captured live stream on top\n    td replay --fixture history.json --live events.sse\n\n    # Emit machine-readable output\n    td replay --fixture history.json --json"
    )]
    Replay(cmd::replay::ReplayArgs),

    #[command(
        about = "Show one activity with its event history",
        after_help = "EXAMPLES:\n    # Show a content activity\n    td show content-10 --fixture history.json\n\n    # Show a membership activity\n    td show workspace_member-e12 --fixture history.json --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Map each message of a JSON-lines file to its activity",
        after_help = "EXAMPLES:\n    # Classify a file\n    td classify messages.jsonl\n\n    # Classify from stdin\n    cat messages.jsonl | td classify --json"
    )]
    Classify(cmd::classify::ClassifyArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    td completions bash\n\n    # Generate zsh completions\n    td completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Filter used when `TIDINGS_LOG` is unset.
const fn default_log_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "tidings=debug,info"
    } else {
        "tidings=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TIDINGS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_log_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("TIDINGS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = tidings_core::config::resolve_config(cli.config.as_deref())
        .map_err(|err| CodedError::new(ErrorCode::ConfigParseError, format!("{err:#}")))?;
    let output = resolve_output_mode(cli.format, cli.json, config.output.as_deref());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Commands::Replay(args) => {
            runtime.block_on(cmd::replay::run_replay(args, &config.feed, output))
        }
        Commands::Show(args) => runtime.block_on(cmd::show::run_show(args, &config.feed, output)),
        Commands::Classify(args) => cmd::classify::run_classify(args, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let error_mode = cli.format.unwrap_or(if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    });

    if let Err(err) = run(&cli) {
        render_error(error_mode, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
