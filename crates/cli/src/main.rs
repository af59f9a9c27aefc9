// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! uruncio - unikernel-launching OCI-compatible runtime shim.

mod commands;
mod exit_error;
mod logging;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use logging::LogFormat;

#[derive(Parser)]
#[command(name = "uruncio", version, about = "Unikernel-launching OCI-compatible container runtime shim")]
pub struct Cli {
    /// Directory holding per-container state, grounded at `/run/uruncio`
    /// by default, matching the original's `StateDir`.
    #[arg(long, global = true, default_value = "/run/uruncio")]
    root: PathBuf,

    /// Write structured logs to this file instead of stderr.
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[arg(long, global = true)]
    debug: bool,

    /// Accepted for OCI-runtime compatibility; cgroup management is out
    /// of scope for this runtime and the flag is otherwise a no-op.
    #[arg(long = "systemd-cgroup", global = true)]
    systemd_cgroup: bool,

    /// Internal: recognized only when this binary reinvokes itself as
    /// the reexec child. Never set by a human caller or a container
    /// engine.
    #[arg(long, hide = true)]
    reexec: bool,

    #[arg(long, hide = true)]
    id: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a container from an OCI bundle without starting it.
    Create {
        id: String,
        #[arg(long = "bundle", short = 'b', default_value = ".")]
        bundle: PathBuf,
    },
    /// Release a created container's reexec child into the monitor.
    Start { id: String },
    /// Create and start a container in one invocation.
    Run {
        id: String,
        #[arg(long = "bundle", short = 'b', default_value = ".")]
        bundle: PathBuf,
    },
    /// Print a container's persisted state record as JSON.
    State { id: String },
    /// Send a signal to a container's monitor process.
    Kill { id: String, signal: String },
    /// Tear down a container and remove its state.
    Delete { id: String },
    /// Not implemented by this runtime.
    Exec {
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let _guard = match logging::init(cli.log.as_deref(), cli.log_format, cli.debug) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: failed to initialize logging: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        let code = err.downcast_ref::<exit_error::ExitError>().map_or(1, |e| e.code);
        let message = format_error(&err);
        tracing::error!(error = %message, "uruncio command failed");
        eprintln!("Error: {message}");
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.reexec {
        let id = cli
            .id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--reexec requires --id"))?;
        return commands::reexec(&cli, &id);
    }

    let Some(ref command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return Ok(());
    };

    match command {
        Commands::Create { id, bundle } => commands::create_container(&cli, &id, &bundle),
        Commands::Start { id } => commands::start_container(&cli, &id),
        Commands::Run { id, bundle } => commands::run_container(&cli, &id, &bundle),
        Commands::State { id } => commands::print_state(&cli, &id),
        Commands::Kill { id, signal } => commands::kill_container(&cli, &id, &signal),
        Commands::Delete { id } => commands::delete_container(&cli, &id),
        Commands::Exec { .. } => commands::exec_container(),
    }
}

/// Deduplicates an anyhow error chain: when the top-level `Display`
/// already contains every source's text (the common case for
/// `thiserror` variants built with `#[from]`), the "Caused by" list
/// would only repeat it.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err.chain().skip(1).all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {i}: {cause}"));
    }
    buf
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
