// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The firecracker adapter. Unlike the other monitors, firecracker isn't
//! driven by a flat argv: it boots from a JSON config file passed via
//! `--config-file`, grounded on the same structural split
//! `cloud_hypervisor.go` uses (build inputs, then `execve`) but adapted
//! to firecracker's own config-file boot path. `exec` is overridden
//! rather than relying on the trait default, since the config file has
//! to be written to disk before the binary is replaced.

use crate::adapter::{MonitorAdapter, MonitorError};
use serde::Serialize;
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use uruncio_core::MonitorExecArgs;

pub const FIRECRACKER_VMM: &str = "firecracker";

#[derive(Serialize)]
struct BootSource {
    kernel_image_path: String,
    boot_args: String,
}

#[derive(Serialize)]
struct MachineConfig {
    vcpu_count: u32,
    mem_size_mib: u64,
}

#[derive(Serialize)]
struct Drive {
    drive_id: String,
    path_on_host: String,
    is_root_device: bool,
    is_read_only: bool,
}

#[derive(Serialize)]
struct NetworkInterface {
    iface_id: String,
    host_dev_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    guest_mac: Option<String>,
}

#[derive(Serialize)]
struct FirecrackerConfig {
    #[serde(rename = "boot-source")]
    boot_source: BootSource,
    #[serde(rename = "machine-config")]
    machine_config: MachineConfig,
    #[serde(rename = "drives")]
    drives: Vec<Drive>,
    #[serde(rename = "network-interfaces")]
    network_interfaces: Vec<NetworkInterface>,
}

fn build_config(args: &MonitorExecArgs) -> FirecrackerConfig {
    let mem = crate::utils::resolve_memory_mib(args.mem_size_bytes);
    let vcpus = if args.vcpus == 0 { 1 } else { args.vcpus };

    let drives = args
        .block_devices
        .iter()
        .enumerate()
        .map(|(i, block)| Drive {
            drive_id: block.id.clone(),
            path_on_host: block.path.display().to_string(),
            is_root_device: i == 0,
            is_read_only: false,
        })
        .collect();

    let network_interfaces = if args.tap_device.is_empty() {
        Vec::new()
    } else {
        vec![NetworkInterface {
            iface_id: "eth0".to_string(),
            host_dev_name: args.tap_device.clone(),
            guest_mac: (!args.guest_mac.is_empty()).then(|| args.guest_mac.clone()),
        }]
    };

    FirecrackerConfig {
        boot_source: BootSource {
            kernel_image_path: args.unikernel_path.display().to_string(),
            boot_args: args.command.clone(),
        },
        machine_config: MachineConfig {
            vcpu_count: vcpus,
            mem_size_mib: mem,
        },
        drives,
        network_interfaces,
    }
}

pub struct Firecracker {
    binary_path: PathBuf,
}

impl Firecracker {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    fn config_path(container: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{container}-fc-config.json"))
    }
}

impl MonitorAdapter for Firecracker {
    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn uses_kvm(&self) -> bool {
        true
    }

    /// Returns the argv firecracker is launched with once its config file
    /// already exists at the path `exec` writes it to.
    fn build_argv(&self, args: &MonitorExecArgs) -> Vec<String> {
        vec![
            self.binary_path.display().to_string(),
            "--no-api".to_string(),
            "--config-file".to_string(),
            Self::config_path(&args.container).display().to_string(),
        ]
    }

    fn exec(&self, args: &MonitorExecArgs) -> Result<(), MonitorError> {
        let config = build_config(args);
        let path = Self::config_path(&args.container);
        let write_config = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&path)?;
            let body = serde_json::to_vec(&config).map_err(std::io::Error::other)?;
            file.write_all(&body)
        };
        if let Err(source) = write_config() {
            return Err(MonitorError::Exec {
                path: path.clone(),
                source,
            });
        }

        let argv = self.build_argv(args);
        tracing::debug!(monitor = ?self.binary_path(), ?argv, "ready to execve monitor");
        let mut command = Command::new(self.binary_path());
        command.args(&argv[1..]);
        command.env_clear();
        for entry in &args.environment {
            if let Some((key, value)) = entry.split_once('=') {
                command.env(key, value);
            }
        }
        let err = command.exec();
        Err(MonitorError::Exec {
            path: self.binary_path().to_path_buf(),
            source: err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uruncio_core::MonitorBlockArgs;

    #[test]
    fn build_config_marks_first_drive_as_root() {
        let config = build_config(&MonitorExecArgs {
            unikernel_path: PathBuf::from("/boot/unikernel.bin"),
            block_devices: vec![MonitorBlockArgs {
                id: "rootfs".into(),
                path: PathBuf::from("/dev/vol0"),
            }],
            ..Default::default()
        });
        assert!(config.drives[0].is_root_device);
        assert_eq!(config.machine_config.mem_size_mib, 256);
    }

    #[test]
    fn build_config_omits_network_interface_without_tap() {
        let config = build_config(&MonitorExecArgs::default());
        assert!(config.network_interfaces.is_empty());
    }

    #[test]
    fn build_argv_points_at_config_file() {
        let monitor = Firecracker::new(PathBuf::from("/usr/bin/firecracker"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            container: "c0".into(),
            ..Default::default()
        });
        assert!(argv.iter().any(|a| a.contains("c0-fc-config.json")));
    }
}
