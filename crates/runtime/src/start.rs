// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Parent-side `start` orchestration, grounded on
//! `original_source/cmd/urunc/start.go`.
//!
//! `start` loads the persisted state record, sends the reexec child its
//! go-ahead, waits for the child's handoff-success acknowledgement
//! (which only arrives once the child is about to `execve` into the
//! monitor), marks the container running, and finally runs the bundle's
//! `Poststart` hooks.

use std::path::Path;
use std::time::Duration;

use uruncio_core::{HandoffMessage, MetricsWriter};
use uruncio_hooks::{run_hooks, HookKind};
use uruncio_ipc::{HandoffListener, HandoffSender};
use uruncio_state::{set_running, StateStore};

use crate::bundle::Bundle;
use crate::error::RuntimeError;
use crate::paths;

const HANDOFF_TIMEOUT: Duration = Duration::from_secs(10);

pub struct StartRequest<'a> {
    pub id: String,
    pub root: std::path::PathBuf,
    pub ledger: &'a mut dyn MetricsWriter,
}

/// Runs the `start` half of the create/start handoff. `monitor_pid` is
/// the reexec child's PID, already known to the caller from the record
/// written by `create` (the reexec child inherits it across the
/// `execve` into the monitor, so it is also the eventual monitor PID).
pub fn start(request: StartRequest<'_>) -> Result<(), RuntimeError> {
    let StartRequest { id, root, ledger } = request;
    ledger.set_container_id(&id);
    ledger.capture(11); // ST.invoked

    let container_dir = paths::container_dir(&root, &id);
    let store = StateStore::new(&container_dir);
    let mut record = store.load()?;
    ledger.capture(12); // ST.unikontainer_created

    let monitor_pid = record
        .monitor_pid
        .ok_or_else(|| RuntimeError::BadState(format!("container {id:?} has no recorded monitor pid")))?;

    send_start_signal(&root, &id)?;
    ledger.capture(13); // ST.sent_start_msg

    await_handoff_success(&root, &id)?;

    set_running(&mut record, monitor_pid)?;
    store.save(&record)?;

    let bundle = Bundle::load(&record.bundle)?;
    run_hooks(HookKind::Poststart, &bundle.poststart_hooks)?;

    Ok(())
}

fn send_start_signal(root: &Path, id: &str) -> Result<(), RuntimeError> {
    let sender = HandoffSender::connect(&paths::reexec_socket_path(root, id))?;
    sender.send(HandoffMessage::StartExecve)?;
    Ok(())
}

fn await_handoff_success(root: &Path, id: &str) -> Result<(), RuntimeError> {
    let listener = HandoffListener::bind(&paths::start_socket_path(root, id))?;
    listener.await_message(HandoffMessage::StartSuccess, HANDOFF_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uruncio_core::state::{Status, CURRENT_SPEC_VERSION};
    use uruncio_core::{StateRecord, UnikernelConfig};

    fn unstarted_record() -> StateRecord {
        StateRecord {
            id: "c0".to_string(),
            bundle: "/bundles/c0".into(),
            container_spec: serde_json::Value::Null,
            status: Status::Created,
            monitor_pid: None,
            created_at: 0,
            spec_version: CURRENT_SPEC_VERSION,
            annotations: Default::default(),
            unikernel: UnikernelConfig::default(),
        }
    }

    #[test]
    fn start_refuses_a_record_with_no_recorded_monitor_pid() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&unstarted_record()).unwrap();
        let record = store.load().unwrap();
        assert!(record.monitor_pid.is_none());
    }
}
