//! dockhand - container entrypoint command supervisor
//!
//! This is the main entry point. It wires together:
//! - Argument parsing (Go-style single-dash flags accepted)
//! - Logging to stderr
//! - Operator signal relay
//! - The Unix launcher and the supervisor core

mod args;

use anyhow::{Context, Result};
use std::io::IsTerminal;
use dockhand_core::{ExitReporter, SignalReceiver, Supervisor, TimeoutPolicy};
use dockhand_host_api::{CommandLine, ForwardedSignal, LaunchOptions};
use dockhand_host_linux::UnixLauncher;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

/// Exit code for failures of the supervisor itself
const SETUP_FAILED_EXIT_CODE: i32 = 1;

/// Signals worth relaying to the child.
///
/// On an interactive terminal a child sharing our process group already
/// receives Ctrl-C and Ctrl-\\ from the terminal driver; relaying them too
/// would deliver each twice.
fn relayed_signals(process_group: bool, interactive: bool) -> Vec<ForwardedSignal> {
    ForwardedSignal::ALL
        .into_iter()
        .filter(|s| process_group || !interactive || !s.is_terminal_generated())
        .collect()
}

/// Relay operator signals received by this process into a channel
fn install_signal_relay(relayed: &[ForwardedSignal]) -> Result<SignalReceiver> {
    let (tx, rx) = mpsc::unbounded_channel();

    for &forwarded in relayed {
        let kind = match forwarded {
            ForwardedSignal::Interrupt => SignalKind::interrupt(),
            ForwardedSignal::Terminate => SignalKind::terminate(),
            ForwardedSignal::Hangup => SignalKind::hangup(),
            ForwardedSignal::Quit => SignalKind::quit(),
        };
        let mut stream = signal(kind)
            .with_context(|| format!("Failed to create {} handler", forwarded))?;

        let tx = tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                debug!(signal = %forwarded, "Received signal");
                if tx.send(forwarded).is_err() {
                    break;
                }
            }
        });
    }

    Ok(rx)
}

async fn run(args: Args) -> Result<i32> {
    let command = CommandLine::from_argv(args.command).context("No command given")?;
    let policy = TimeoutPolicy::new(args.cmd_timeout);
    let options = LaunchOptions {
        process_group: args.process_group,
    };

    let signals = if args.no_forward_signals {
        None
    } else {
        let interactive = std::io::stdin().is_terminal();
        let relayed = relayed_signals(options.process_group, interactive);
        debug!(?relayed, interactive, "Installing signal relay");
        Some(install_signal_relay(&relayed)?)
    };

    let supervisor = Supervisor::new(UnixLauncher::new()).with_options(options);
    let mut reporter = ExitReporter::stderr();
    let report = supervisor
        .execute(&command, policy, signals, &mut reporter)
        .await;

    info!(exit_code = report.exit_code, "dockhand exiting");
    Ok(report.exit_code)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse_normalized();

    // Initialize logging; stdout belongs to the child
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "dockhand starting");

    let exit_code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dockhand: {:#}", e);
            SETUP_FAILED_EXIT_CODE
        }
    };

    std::process::exit(exit_code);
}
