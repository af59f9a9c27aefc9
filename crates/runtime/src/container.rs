// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Builds a container's static [`UnikernelConfig`] from its bundle
//! annotations, grounded on
//! `original_source/pkg/unikontainers/unikontainers.go`'s annotation
//! parsing in `NewUnikontainer`.

use crate::bundle::Bundle;
use crate::error::RuntimeError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uruncio_config::UruncConfig;
use uruncio_core::annotations;
use uruncio_core::{NetworkParams, RootfsParams, UnikernelConfig};
use uruncio_rootfs::handle_explicit_block_image;

/// Parses the static, annotation-derived half of a container's unikernel
/// configuration. Fields that depend on the target namespaces (actual
/// block devices discovered via mountinfo, the tap device, guest MAC)
/// are resolved later by the reexec child, once it has joined them.
pub fn resolve_static_config(bundle: &Bundle, config: &UruncConfig) -> Result<UnikernelConfig, RuntimeError> {
    let ann = &bundle.annotations;

    let unikernel_type = ann.get(annotations::UNIKERNEL_TYPE).cloned().unwrap_or_default();
    if uruncio_unikernel::adapter_for(&unikernel_type).is_none() {
        return Err(RuntimeError::UnsupportedUnikernel(unikernel_type));
    }

    let hypervisor = ann.get(annotations::HYPERVISOR).cloned().unwrap_or_default();
    let binary_path = config
        .hypervisors
        .get(&hypervisor)
        .map(|hv| PathBuf::from(&hv.binary_path))
        .unwrap_or_default();
    if uruncio_monitor::adapter_for(&hypervisor, binary_path).is_none() {
        return Err(RuntimeError::UnsupportedMonitor(hypervisor));
    }

    let unikernel_path = PathBuf::from(ann.get(annotations::UNIKERNEL_BINARY).cloned().unwrap_or_default());
    let initrd_path = ann.get(annotations::INITRD).map(PathBuf::from);
    let cmdline = ann.get(annotations::CMDLINE).cloned().unwrap_or_default();

    let block_image = ann.get(annotations::BLOCK).map(PathBuf::from);
    let mount_point = ann.get(annotations::MOUNTPOINT).cloned().unwrap_or_default();
    let explicit_block = handle_explicit_block_image(block_image.as_ref(), &mount_point)?;

    let vaccel_rpc_address = ann.get(annotations::VACCEL_RPC_ADDRESS).cloned();

    Ok(UnikernelConfig {
        unikernel_type,
        hypervisor,
        unikernel_path,
        initrd_path,
        cmdline,
        rootfs: RootfsParams::default(),
        block_devices: explicit_block.into_iter().collect(),
        network: NetworkParams::default(),
        vaccel_rpc_address,
    })
}

/// Parses a `urunc.dev/mirage-{net,block}-map` annotation's JSON object
/// into a host-ID -> guest-name map. Malformed or absent annotations
/// yield an empty map, matching the adapter's own permissive fallback.
pub fn parse_device_map(ann: &BTreeMap<String, String>, key: &str) -> BTreeMap<String, String> {
    ann.get(key)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}
