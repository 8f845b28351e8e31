//! # termdeck
//!
//! A small terminal multiplexer driven over stdin/stdout.
//!
//! ## Overview
//!
//! Sessions run in pseudo-terminals; one is attached at a time and its
//! output is echoed to stdout. Lines read from stdin are commands (`help`
//! lists them). Logs go to stderr.
//!
//! ## Architecture
//!
//! This is the binary on top of the stack:
//! - termdeck-core: Core types and configuration
//! - termdeck-host: PTY hosting
//! - termdeck-session: Session registry, controller and event loop

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use termdeck::{build_controller, parse_line, pty_host, Console, Request, HELP};
use termdeck_core::Config;
use termdeck_host::event_channel;
use termdeck_session::ControllerLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("usage: termdeck [--config <file.yaml>]\n\n{HELP}");
        return Ok(());
    }
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1));

    let config = match config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => Config::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    tracing::info!(
        "termdeck v{} starting (max_sessions={})",
        env!("CARGO_PKG_VERSION"),
        config.sessions.max_sessions
    );

    let console = Console::stdout();
    let (events_tx, events_rx) = event_channel();
    let host = pty_host(&config, events_tx);
    let mut controller = build_controller(config, host, &console)?;
    controller.became_visible();

    let (event_loop, handle) = ControllerLoop::new(controller, events_rx);
    let loop_task = tokio::spawn(event_loop.run());

    let input_console = console.clone();
    let input_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            match parse_line(&line) {
                Ok(None) => {}
                Ok(Some(Request::Help)) => input_console.line(HELP),
                Ok(Some(Request::Input(input))) => {
                    if handle.send(input).is_err() {
                        break;
                    }
                }
                Err(e) => input_console.line(&format!("error: {e}")),
            }
        }
        let _ = handle.shutdown();
    });

    let mut controller = loop_task.await.context("Controller loop panicked")?;
    input_task.abort();

    controller.terminate_all();
    tracing::info!("termdeck shutting down");

    Ok(())
}
