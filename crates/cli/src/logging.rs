// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Structured logging setup. `--log-format text` writes human-readable
//! lines; `json` writes one structured record per event, matching the
//! `urunc_config.log` shape's `level`/`syslog`-style intent but driven
//! by CLI flags rather than the config file, since the runtime must be
//! able to log before any config has been loaded.

use std::path::Path;

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn filter(debug: bool) -> EnvFilter {
    let default_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes the global subscriber. Returns the non-blocking writer's
/// guard, which must be kept alive for the process lifetime or buffered
/// log lines are dropped on exit.
pub fn init(
    log_path: Option<&Path>,
    format: LogFormat,
    debug: bool,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match log_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter(debug))
            .with_writer(writer)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter(debug))
            .with_writer(writer)
            .json()
            .init(),
    }

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
