// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! `state`, `kill`, and `delete`, grounded on
//! `original_source/cmd/urunc/{state,kill,delete}.go`.
//!
//! `kill` forwards the requested signal straight to the monitor PID.
//! `delete` on a still-running container first escalates to
//! [`uruncio_monitor::kill_and_wait`] (SIGKILL, poll until the process is
//! gone) before removing the state directory, since the OCI runtime
//! contract requires `delete` to leave nothing behind.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use uruncio_core::StateRecord;
use uruncio_monitor::kill_and_wait;
use uruncio_state::{set_stopped, StateStore};

use crate::error::RuntimeError;

/// Loads and returns the current state record, exactly as the `state`
/// subcommand reports it.
pub fn state(container_dir: &std::path::Path) -> Result<StateRecord, RuntimeError> {
    Ok(StateStore::new(container_dir).load()?)
}

/// Sends `signal` to the container's monitor process. Does not wait for
/// the process to react, matching `kill`'s fire-and-forget contract.
pub fn send_signal(container_dir: &std::path::Path, signal: Signal) -> Result<(), RuntimeError> {
    let record = StateStore::new(container_dir).load()?;
    let pid = record
        .monitor_pid
        .ok_or_else(|| RuntimeError::BadState(format!("container {:?} is not running", record.id)))?;
    kill(Pid::from_raw(pid), signal).map_err(|source| RuntimeError::Signal {
        path: container_dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Removes a container's state, forcibly stopping its monitor first if
/// it is still running.
pub fn delete(container_dir: &std::path::Path) -> Result<(), RuntimeError> {
    let store = StateStore::new(container_dir);
    let mut record = store.load()?;
    if record.is_running() {
        if let Some(pid) = record.monitor_pid {
            kill_and_wait(pid, None)?;
        }
        set_stopped(&mut record);
        store.save(&record)?;
    }
    store.remove()?;
    Ok(())
}
