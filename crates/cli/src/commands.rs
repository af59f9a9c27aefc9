// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Maps each CLI subcommand onto the `uruncio-runtime` orchestration
//! functions, and implements the reexec child's own entry point.

use std::path::{Path, PathBuf};

use nix::sys::signal::Signal;
use uruncio_config::UruncConfig;
use uruncio_core::MetricsWriter;
use uruncio_runtime::{create, paths, query, start, Bundle, CreateRequest, StartRequest};
use uruncio_state::StateStore;
use uruncio_unikernel::rumprun::RUMPRUN_UNIKERNEL;

use crate::exit_error::ExitError;
use crate::Cli;

const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

fn ledger_for(config: &UruncConfig) -> anyhow::Result<Box<dyn MetricsWriter + Send + Sync>> {
    let target = config.timestamps.enabled.then(|| PathBuf::from(&config.timestamps.destination));
    Ok(uruncio_ledger::new_ledger(target.as_deref())?)
}

pub fn create_container(cli: &Cli, id: &str, bundle: &Path) -> anyhow::Result<()> {
    let config = UruncConfig::defaults();
    let mut ledger = ledger_for(&config)?;
    let current_exe = std::env::current_exe()?;
    let record = create(CreateRequest {
        id: id.to_string(),
        bundle_dir: bundle.to_path_buf(),
        root: cli.root.clone(),
        current_exe,
        config: &config,
        ledger: ledger.as_mut(),
    })?;
    tracing::info!(id = %record.id, status = record.status.as_str(), "container created");
    Ok(())
}

pub fn start_container(cli: &Cli, id: &str) -> anyhow::Result<()> {
    let mut ledger = ledger_for(&UruncConfig::defaults())?;
    start(StartRequest {
        id: id.to_string(),
        root: cli.root.clone(),
        ledger: ledger.as_mut(),
    })?;
    tracing::info!(id, "container started");
    Ok(())
}

/// `run` is `create` followed immediately by `start`, sharing one
/// configuration and ledger across both phases.
pub fn run_container(cli: &Cli, id: &str, bundle: &Path) -> anyhow::Result<()> {
    let config = UruncConfig::defaults();
    let current_exe = std::env::current_exe()?;
    {
        let mut ledger = ledger_for(&config)?;
        create(CreateRequest {
            id: id.to_string(),
            bundle_dir: bundle.to_path_buf(),
            root: cli.root.clone(),
            current_exe,
            config: &config,
            ledger: ledger.as_mut(),
        })?;
    }
    let mut ledger = ledger_for(&config)?;
    start(StartRequest {
        id: id.to_string(),
        root: cli.root.clone(),
        ledger: ledger.as_mut(),
    })?;
    tracing::info!(id, "container running");
    Ok(())
}

pub fn print_state(cli: &Cli, id: &str) -> anyhow::Result<()> {
    let dir = paths::container_dir(&cli.root, id);
    let record = query::state(&dir)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn kill_container(cli: &Cli, id: &str, signal: &str) -> anyhow::Result<()> {
    let sig = parse_signal(signal)?;
    let dir = paths::container_dir(&cli.root, id);
    query::send_signal(&dir, sig)?;
    Ok(())
}

pub fn delete_container(cli: &Cli, id: &str) -> anyhow::Result<()> {
    let dir = paths::container_dir(&cli.root, id);
    query::delete(&dir)?;
    Ok(())
}

pub fn exec_container() -> anyhow::Result<()> {
    Err(ExitError::new(2, "exec is not implemented by this runtime"))
}

fn parse_signal(raw: &str) -> anyhow::Result<Signal> {
    if let Ok(number) = raw.parse::<i32>() {
        return Signal::try_from(number).map_err(|_| anyhow::anyhow!("unknown signal number {raw}"));
    }
    let name = raw.trim_start_matches("SIG").to_uppercase();
    format!("SIG{name}")
        .parse::<Signal>()
        .map_err(|_| anyhow::anyhow!("unknown signal {raw}"))
}

/// The reexec child's own entry point, invoked as
/// `uruncio --reexec --root <root> --id <id>`. Joins the target
/// container's namespaces, waits for the create-parent's prestart
/// acknowledgement, blocks for `start`'s go-ahead, prepares the guest's
/// rootfs and block devices, and finally `execve`s into the monitor.
/// Only returns on failure; the success path never comes back.
pub fn reexec(cli: &Cli, id: &str) -> anyhow::Result<()> {
    let root = &cli.root;
    let container_dir = paths::container_dir(root, id);
    let store = StateStore::new(&container_dir);
    let record = store.load()?;
    let bundle = Bundle::load(&record.bundle)?;

    let config = UruncConfig::defaults();
    let mut ledger = ledger_for(&config)?;
    ledger.set_container_id(id);
    ledger.capture(4); // RX.create_invoked

    uruncio_runtime::reexec::join_namespaces(&bundle.namespace_paths)?;
    ledger.capture(5); // RX.close_pipes_and_setup_base

    uruncio_runtime::reexec::await_prestart_ack(root, id)?;
    ledger.capture(9); // RX.received_ack

    uruncio_runtime::reexec::await_start_signal(root, id)?;
    ledger.capture(14); // RX.received_start_msg

    let hypervisor_path = config
        .hypervisors
        .get(&record.unikernel.hypervisor)
        .map(|hv| PathBuf::from(&hv.binary_path))
        .unwrap_or_default();
    let monitor_adapter = uruncio_monitor::adapter_for(&record.unikernel.hypervisor, hypervisor_path)
        .ok_or_else(|| anyhow::anyhow!("unsupported hypervisor {:?}", record.unikernel.hypervisor))?;
    let mut unikernel_adapter = uruncio_unikernel::adapter_for(&record.unikernel.unikernel_type)
        .ok_or_else(|| anyhow::anyhow!("unsupported unikernel type {:?}", record.unikernel.unikernel_type))?;

    let manifest = uruncio_unikernel::parse_manifest_from_file(&record.unikernel.unikernel_path)
        .map_err(|err| tracing::debug!(error = %err, "no usable solo5 manifest on unikernel binary"))
        .ok();
    let params = uruncio_runtime::reexec::unikernel_params(&bundle, &record.unikernel, manifest);
    unikernel_adapter.init(&params);
    ledger.capture(15); // RX.joined_netns
    ledger.capture(16); // RX.network_setup_completed

    let mon_rootfs = paths::mon_rootfs_dir(root, id);
    let rumprun = record.unikernel.unikernel_type == RUMPRUN_UNIKERNEL;
    let devices = uruncio_runtime::reexec::prepare_block_devices(
        &record.unikernel,
        &bundle.mounts,
        &mon_rootfs,
        Path::new(MOUNTINFO_PATH),
        rumprun,
        monitor_adapter.uses_kvm(),
        &|fs_type: &str| unikernel_adapter.supports_fs(fs_type),
    )?;
    if let Some(vaccel) = uruncio_runtime::reexec::prepare_vaccel(&bundle, &record.unikernel.hypervisor, &mon_rootfs)? {
        tracing::debug!(vaccel_type = %vaccel.vaccel_type, rpc_address = %vaccel.rpc_address, "vaccel configured");
    }
    ledger.capture(17); // RX.disk_setup_completed

    let args = uruncio_runtime::reexec::build_monitor_args(
        id,
        &record.unikernel,
        unikernel_adapter.as_ref(),
        &devices,
    )?;

    uruncio_runtime::reexec::signal_start_success(root, id)?;
    ledger.capture(18); // RX.execve_hypervisor

    monitor_adapter.exec(&args)?;
    unreachable!("execve replaces the process image on success")
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
