// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Timestamp ledger: captures the fixed phase markers defined in
//! `uruncio_core::timestamp` to a JSON-lines sidecar file, grounded on
//! `original_source/internal/metrics/metrics.go`'s `zerologMetrics` and
//! `mockWriter`.
//!
//! Each container gets its own ledger file, opened in append mode and
//! written one JSON object per captured timestamp. The file is
//! independent of the process's own diagnostic log, mirroring the
//! original's dedicated zerolog logger instance.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uruncio_core::timestamp::{TimestampId, TIMESTAMPS};
use uruncio_core::MetricsWriter;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to open ledger file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct LedgerRecord<'a> {
    #[serde(rename = "containerID")]
    container_id: &'a str,
    #[serde(rename = "timestampID")]
    timestamp_id: &'static str,
    #[serde(rename = "timestampName")]
    timestamp_name: &'static str,
    #[serde(rename = "timestampOrder")]
    timestamp_order: usize,
    /// Nanoseconds since the Unix epoch, named `time` to match zerolog's
    /// own `Timestamp()` field name under `TimeFieldFormat =
    /// TimeFormatUnixNano`.
    #[serde(rename = "time")]
    timestamp_unix_nano: u128,
}

/// Logged instead of `LedgerRecord` when `capture` is given an ID
/// outside the fixed timestamp table.
#[derive(Serialize)]
struct InvalidLedgerRecord<'a> {
    #[serde(rename = "containerID")]
    container_id: &'a str,
    #[serde(rename = "timestampID_invalid")]
    timestamp_id_invalid: TimestampId,
    #[serde(rename = "time")]
    timestamp_unix_nano: u128,
}

/// Writes one JSON object per captured timestamp to a file, flushed
/// immediately so a crash mid-phase still leaves prior markers intact.
pub struct FileLedger {
    file: Mutex<File>,
    container_id: String,
}

impl FileLedger {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LedgerError::Open {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            file: Mutex::new(file),
            container_id: String::new(),
        })
    }
}

impl MetricsWriter for FileLedger {
    fn set_container_id(&mut self, container_id: &str) {
        self.container_id = container_id.to_string();
    }

    fn capture(&self, id: TimestampId) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let Some(meta) = TIMESTAMPS.get(id) else {
            tracing::warn!(timestamp_id = id, "invalid timestamp id");
            let record = InvalidLedgerRecord {
                container_id: &self.container_id,
                timestamp_id_invalid: id,
                timestamp_unix_nano: nanos,
            };
            self.write_line(&record);
            return;
        };
        let record = LedgerRecord {
            container_id: &self.container_id,
            timestamp_id: meta.legacy_id,
            timestamp_name: meta.name,
            timestamp_order: meta.order,
            timestamp_unix_nano: nanos,
        };
        self.write_line(&record);
    }
}

impl FileLedger {
    fn write_line<T: Serialize>(&self, record: &T) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

/// No-op ledger used when metrics capture was not requested.
#[derive(Default)]
pub struct NullLedger;

impl MetricsWriter for NullLedger {
    fn set_container_id(&mut self, _container_id: &str) {}
    fn capture(&self, _id: TimestampId) {}
}

/// Builds the ledger to use for a container, given the optional target
/// path from configuration or CLI flag. `None` yields a no-op ledger.
pub fn new_ledger(target: Option<&Path>) -> Result<Box<dyn MetricsWriter + Send + Sync>, LedgerError> {
    match target {
        Some(path) => Ok(Box::new(FileLedger::open(path)?)),
        None => Ok(Box::new(NullLedger)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn captures_append_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.set_container_id("c0");
        ledger.capture(0);
        ledger.capture(11);

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"timestampID\":\"TS00\""));
        assert!(lines[1].contains("\"timestampID\":\"TS11\""));
        assert!(lines[0].contains("\"containerID\":\"c0\""));
    }

    #[test]
    fn invalid_id_writes_an_invalid_marker_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = FileLedger::open(&path).unwrap();
        ledger.set_container_id("c0");
        ledger.capture(999);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"containerID\":\"c0\""));
        assert!(contents.contains("\"timestampID_invalid\":999"));
        assert!(!contents.contains("\"timestampID\":"));
    }

    #[test]
    fn null_ledger_is_a_no_op() {
        let mut ledger = NullLedger;
        ledger.set_container_id("c0");
        ledger.capture(0);
    }
}
