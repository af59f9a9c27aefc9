// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Parent-side `create` orchestration, grounded on
//! `original_source/cmd/urunc/create.go`.
//!
//! `create` parses the bundle, resolves the static unikernel
//! configuration, persists a `created` state record, spawns the reexec
//! child (which blocks on namespace join and rootfs setup before waiting
//! for `start`), runs the bundle's `Prestart` hooks, then releases the
//! child via the ack socket and returns.

use std::path::{Path, PathBuf};
use std::process::Command;

use uruncio_config::UruncConfig;
use uruncio_core::state::{Status, CURRENT_SPEC_VERSION};
use uruncio_core::{HandoffMessage, MetricsWriter, StateRecord};
use uruncio_hooks::{run_hooks, HookKind};
use uruncio_ipc::HandoffSender;
use uruncio_state::StateStore;

use crate::bundle::Bundle;
use crate::container::resolve_static_config;
use crate::error::RuntimeError;
use crate::paths;

const ACK_CONNECT_RETRIES: u32 = 50;
const ACK_CONNECT_BACKOFF_MS: u64 = 20;

/// Everything `create` needs beyond the bundle and the runtime root.
pub struct CreateRequest<'a> {
    pub id: String,
    pub bundle_dir: PathBuf,
    pub root: PathBuf,
    pub current_exe: PathBuf,
    pub config: &'a UruncConfig,
    pub ledger: &'a mut dyn MetricsWriter,
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn create(request: CreateRequest<'_>) -> Result<StateRecord, RuntimeError> {
    let CreateRequest {
        id,
        bundle_dir,
        root,
        current_exe,
        config,
        ledger,
    } = request;

    ledger.set_container_id(&id);
    ledger.capture(0); // CR.invoked

    let bundle = Bundle::load(&bundle_dir)?;
    let unikernel = resolve_static_config(&bundle, config)?;

    let mut record = StateRecord {
        id: id.clone(),
        bundle: bundle_dir.clone(),
        container_spec: bundle.raw_spec.clone(),
        status: Status::Created,
        monitor_pid: None,
        created_at: now_millis(),
        spec_version: CURRENT_SPEC_VERSION,
        annotations: bundle.annotations.clone(),
        unikernel,
    };
    ledger.capture(1); // CR.unikontainer_created

    let container_dir = paths::container_dir(&root, &id);
    std::fs::create_dir_all(&container_dir)?;
    let store = StateStore::new(&container_dir);
    store.save(&record)?;
    ledger.capture(2); // CR.initial_setup

    let child = spawn_reexec_child(&current_exe, &root, &id)?;
    ledger.capture(3); // CR.start_reexec

    record.monitor_pid = Some(child.id() as i32);
    store.save(&record)?;
    ledger.capture(6); // CR.received_pids

    run_hooks(HookKind::Prestart, &bundle.prestart_hooks)?;
    ledger.capture(7); // CR.hooks_executed

    send_ack(&root, &id)?;
    ledger.capture(8); // CR.sent_ack

    drop(child);
    ledger.capture(10); // CR.terminated
    Ok(record)
}

fn spawn_reexec_child(current_exe: &Path, root: &Path, id: &str) -> Result<std::process::Child, RuntimeError> {
    let child = Command::new(current_exe)
        .arg("--reexec")
        .arg("--root")
        .arg(root)
        .arg("--id")
        .arg(id)
        .spawn()?;
    Ok(child)
}

/// Connects to the reexec child's ack socket and delivers the
/// prestart-hooks acknowledgement, retrying briefly since the child may
/// not have bound it yet.
fn send_ack(root: &Path, id: &str) -> Result<(), RuntimeError> {
    let path = paths::ack_socket_path(root, id);
    let mut attempt = 0;
    loop {
        match HandoffSender::connect(&path) {
            Ok(sender) => return sender.send(HandoffMessage::Ack).map_err(Into::into),
            Err(_) if attempt < ACK_CONNECT_RETRIES => {
                attempt += 1;
                std::thread::sleep(std::time::Duration::from_millis(ACK_CONNECT_BACKOFF_MS));
            }
            Err(err) => return Err(err.into()),
        }
    }
}
