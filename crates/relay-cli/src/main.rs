//! mcp-relay: bridges a stdio MCP client to a remote MCP endpoint over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use relay_config::{CliOverrides, REMOTE_URL_ENV, RelayConfig};
use relay_core::{HttpEndpoint, Relay, fatal_envelope, in_forward_task, panic_message};
use std::io::{self, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-relay",
    version,
    about = "Relay newline-delimited JSON-RPC from stdin to a remote MCP endpoint"
)]
struct Cli {
    /// Remote endpoint URL (MCP_REMOTE_URL takes precedence)
    url: Option<String>,

    /// Write responses in input order instead of completion order
    #[arg(long)]
    ordered: bool,

    /// Write error envelopes to stdout alongside responses
    #[arg(long)]
    errors_to_stdout: bool,

    /// Fail a forward that takes longer than this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable verbose/debug logging (on stderr, mixed with error envelopes)
    #[arg(long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Set up logging. Stderr is also the error channel, so it stays silent
    // unless asked for.
    let log_level = if cli.verbose { "debug" } else { "off" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    std::panic::set_hook(Box::new(|info| {
        let message = panic_message(info.payload());
        if in_forward_task() {
            // The relay reports it as a failed forward task.
            tracing::debug!("Forward task panicked: {message}");
            return;
        }
        report_fatal(format!("Uncaught panic: {message}"));
        std::process::exit(1);
    }));

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            report_fatal(format!("{e:#}"));
            1
        }
    };

    // Stdin is read on a blocking thread that cannot be cancelled, so waiting
    // for runtime shutdown could hang until the next input line.
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = RelayConfig::load(CliOverrides {
        url: cli.url,
        ordered: cli.ordered,
        errors_to_stdout: cli.errors_to_stdout,
        timeout_ms: cli.timeout_ms,
    })
    .context("Failed to load configuration")?;

    if config.endpoint.is_default() {
        eprintln!(
            "mcp-relay: no endpoint configured (set {REMOTE_URL_ENV} or pass a URL), using default {}",
            config.endpoint.url
        );
    }
    tracing::info!(
        "Endpoint {} (from {})",
        config.endpoint.url,
        config.endpoint.source
    );

    let endpoint = HttpEndpoint::new(config.endpoint.url.clone(), config.timeout_ms)
        .context("Failed to create HTTP client")?;
    let relay = Relay::new(Arc::new(endpoint), config.options);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let summary = relay
        .run(tokio::io::stdin(), &mut stdout, &mut stderr, cancel)
        .await?;

    tracing::info!(
        "Relay finished: {} forwarded, {} responses, {} errors{}",
        summary.forwarded,
        summary.responses,
        summary.errors,
        if summary.interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}

/// Write the final error envelope for a process-level fault to stderr.
fn report_fatal(reason: String) {
    let envelope = fatal_envelope(reason);
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{envelope}");
    let _ = stderr.flush();
}
