// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The MirageOS adapter, grounded on
//! `original_source/pkg/unikontainers/unikernels/mirage.go`.

use crate::adapter::{CommandStringError, UnikernelAdapter, UnikernelParams};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uruncio_core::solo5::{DeviceType, Solo5Manifest};
use uruncio_core::{MonitorBlockArgs, MonitorCliArgs};

pub const MIRAGE_UNIKERNEL: &str = "mirage";

/// Default Solo5 device name used when no `urunc.dev/mirage-*-map`
/// annotation supplies a guest-visible name for a given host device.
const DEFAULT_DEVICE_NAME: &str = "service";
const DEFAULT_BLOCK_DEVICE_NAME: &str = "storage";

/// Resolves a device's guest-visible name: an explicit host-ID -> name
/// annotation wins, then the Solo5 manifest's sole entry of the
/// relevant type, then `default`. A resolved name outside
/// `[A-Za-z0-9_]+` is discarded in favor of `default`.
fn resolve_device_name(
    map: &BTreeMap<String, String>,
    host_key: &str,
    manifest: &Option<Solo5Manifest>,
    device_type: DeviceType,
    default: &str,
) -> String {
    let candidate = map.get(host_key).cloned().or_else(|| {
        manifest
            .as_ref()
            .and_then(|m| m.unique_of_type(device_type))
            .map(|entry| entry.name.clone())
    });
    match candidate {
        Some(name) if is_valid_device_name(&name) => name,
        _ => default.to_string(),
    }
}

fn is_valid_device_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[derive(Debug, Clone, Default)]
struct MirageNet {
    address: String,
    gateway: String,
}

#[derive(Debug, Clone)]
struct MirageBlock {
    host_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Mirage {
    command: String,
    monitor: String,
    net: MirageNet,
    block: Vec<MirageBlock>,
    net_device_map: BTreeMap<String, String>,
    block_device_map: BTreeMap<String, String>,
    manifest: Option<Solo5Manifest>,
}

impl UnikernelAdapter for Mirage {
    fn init(&mut self, params: &UnikernelParams) {
        if params.network.is_enabled() {
            self.net.address = format!("--ipv4={}/24", params.network.ip);
            self.net.gateway = format!("--ipv4-gateway={}", params.network.gateway);
        } else {
            self.net = MirageNet::default();
        }
        self.block = params
            .block
            .iter()
            .map(|blk| MirageBlock {
                host_path: blk.source.clone(),
            })
            .collect();
        self.command = params.cmdline.join(" ");
        self.monitor = params.monitor.clone();
        self.net_device_map = params.net_device_map.clone();
        self.block_device_map = params.block_device_map.clone();
        self.manifest = params.manifest.clone();
    }

    fn command_string(&self) -> Result<String, CommandStringError> {
        Ok(format!("{} {} {}", self.net.address, self.net.gateway, self.command))
    }

    fn supports_block(&self) -> bool {
        true
    }

    fn supports_fs(&self, _fs_type: &str) -> bool {
        false
    }

    fn monitor_net_cli(&self, if_name: &str, mac: &str) -> String {
        match self.monitor.as_str() {
            "hvt" | "spt" => {
                let name = resolve_device_name(
                    &self.net_device_map,
                    if_name,
                    &self.manifest,
                    DeviceType::NetBasic,
                    DEFAULT_DEVICE_NAME,
                );
                format!("--net:{name}={if_name} --net-mac:{name}={mac}")
            }
            _ => String::new(),
        }
    }

    fn monitor_block_cli(&self) -> Vec<MonitorBlockArgs> {
        if self.block.is_empty() {
            return Vec::new();
        }
        match self.monitor.as_str() {
            "hvt" | "spt" => {
                let host_key = self.block_device_map.keys().next().cloned().unwrap_or_default();
                let name = resolve_device_name(
                    &self.block_device_map,
                    &host_key,
                    &self.manifest,
                    DeviceType::BlockBasic,
                    DEFAULT_BLOCK_DEVICE_NAME,
                );
                vec![MonitorBlockArgs {
                    id: name,
                    path: self.block[0].host_path.clone(),
                }]
            }
            _ => Vec::new(),
        }
    }

    fn monitor_cli(&self) -> MonitorCliArgs {
        MonitorCliArgs::default()
    }
}
