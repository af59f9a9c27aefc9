// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Atomic persistence of [`StateRecord`] to a per-container `state.json`,
//! grounded on `groblegark-oddjobs`'s `crates/storage/src/state.rs`
//! write-temp-then-rename convention and on the lifecycle transitions in
//! `original_source/cmd/urunc/start.go`'s `SetRunningState`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uruncio_core::state::{Status, CURRENT_SPEC_VERSION};
use uruncio_core::StateRecord;

pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("container state not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state file {path} is spec_version {found}, this build understands {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("cannot transition container {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },
}

/// Owns the on-disk location of one container's state directory.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    /// Reads and parses the state record, if present.
    pub fn load(&self) -> Result<StateRecord, StateError> {
        let path = self.state_path();
        if !path.exists() {
            return Err(StateError::NotFound(path));
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| StateError::Read {
            path: path.clone(),
            source,
        })?;
        let record: StateRecord =
            serde_json::from_str(&contents).map_err(|source| StateError::Parse {
                path: path.clone(),
                source,
            })?;
        if record.spec_version != CURRENT_SPEC_VERSION {
            return Err(StateError::VersionMismatch {
                path,
                found: record.spec_version,
                expected: CURRENT_SPEC_VERSION,
            });
        }
        Ok(record)
    }

    /// Writes `record` atomically: a sibling temp file is written and
    /// fsynced, then renamed over the real path so a concurrent reader
    /// never observes a partial write.
    pub fn save(&self, record: &StateRecord) -> Result<(), StateError> {
        let path = self.state_path();
        std::fs::create_dir_all(&self.dir).map_err(|source| StateError::Write {
            path: path.clone(),
            source,
        })?;
        let tmp_path = self.dir.join(format!(".{STATE_FILE_NAME}.tmp"));
        let encoded = serde_json::to_vec_pretty(record).map_err(|source| StateError::Parse {
            path: path.clone(),
            source,
        })?;
        {
            let mut file =
                std::fs::File::create(&tmp_path).map_err(|source| StateError::Write {
                    path: tmp_path.clone(),
                    source,
                })?;
            use std::io::Write as _;
            file.write_all(&encoded)
                .and_then(|_| file.sync_all())
                .map_err(|source| StateError::Write {
                    path: tmp_path.clone(),
                    source,
                })?;
        }
        std::fs::rename(&tmp_path, &path).map_err(|source| StateError::Write { path, source })?;
        Ok(())
    }

    /// Removes the state directory entirely. Used by `delete`.
    pub fn remove(&self) -> Result<(), StateError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Write {
                path: self.dir.clone(),
                source,
            }),
        }
    }
}

/// Advances a loaded record from `created` to `running`, recording the
/// monitor PID. Refuses to move a container that is already running or
/// has stopped, mirroring the original's `SetRunningState` guard.
pub fn set_running(record: &mut StateRecord, monitor_pid: i32) -> Result<(), StateError> {
    if !matches!(record.status, Status::Created) {
        return Err(StateError::InvalidTransition {
            id: record.id.clone(),
            from: record.status.as_str(),
            to: "running",
        });
    }
    record.status = Status::Running;
    record.monitor_pid = Some(monitor_pid);
    Ok(())
}

/// Advances a loaded record to `stopped`. Valid from any prior status,
/// since `kill`/`delete` may race a monitor that already exited.
pub fn set_stopped(record: &mut StateRecord) {
    record.status = Status::Stopped;
    record.monitor_pid = None;
}

pub fn container_state_dir(base: &Path, container_id: &str) -> PathBuf {
    base.join(container_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uruncio_core::state::UnikernelConfig;

    fn sample(id: &str) -> StateRecord {
        StateRecord {
            id: id.to_string(),
            bundle: PathBuf::from("/bundles/c0"),
            container_spec: serde_json::Value::Null,
            status: Status::Created,
            monitor_pid: None,
            created_at: 1_700_000_000_000,
            spec_version: CURRENT_SPEC_VERSION,
            annotations: Default::default(),
            unikernel: UnikernelConfig::default(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let record = sample("c0");
        store.save(&record).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn load_missing_state_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[test]
    fn set_running_transitions_from_created() {
        let mut record = sample("c0");
        set_running(&mut record, 1234).unwrap();
        assert_eq!(record.status, Status::Running);
        assert_eq!(record.monitor_pid, Some(1234));
    }

    #[test]
    fn set_running_refuses_when_already_running() {
        let mut record = sample("c0");
        set_running(&mut record, 1234).unwrap();
        let err = set_running(&mut record, 5678).unwrap_err();
        assert!(matches!(err, StateError::InvalidTransition { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&sample("c0")).unwrap();
        store.remove().unwrap();
        store.remove().unwrap();
        assert!(!dir.path().join(STATE_FILE_NAME).exists());
    }
}
