// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The cloud-hypervisor adapter, grounded on
//! `original_source/pkg/unikontainers/hypervisors/cloud_hypervisor.go`.

use crate::adapter::MonitorAdapter;
use crate::utils::resolve_memory_mib;
use std::path::{Path, PathBuf};
use uruncio_core::MonitorExecArgs;

pub const CLOUD_HYPERVISOR_VMM: &str = "cloud-hypervisor";

pub struct CloudHypervisor {
    binary_path: PathBuf,
}

impl CloudHypervisor {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

impl MonitorAdapter for CloudHypervisor {
    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn uses_kvm(&self) -> bool {
        true
    }

    fn build_argv(&self, args: &MonitorExecArgs) -> Vec<String> {
        let api_socket_path = format!("/tmp/{}-ch.sock", args.container);
        let mem = resolve_memory_mib(args.mem_size_bytes);

        let mut argv = vec![
            self.binary_path.display().to_string(),
            "--api-socket".to_string(),
            api_socket_path,
            "--cpus".to_string(),
            "boot=1".to_string(),
            "--memory".to_string(),
            format!("size={mem}M"),
            "--kernel".to_string(),
            args.unikernel_path.display().to_string(),
            "--cmdline".to_string(),
            args.command.clone(),
        ];

        if !args.tap_device.is_empty() {
            let mut net = format!("tap={}", args.tap_device);
            if !args.guest_mac.is_empty() {
                net.push_str(&format!(",mac={}", args.guest_mac));
            }
            argv.push("--net".to_string());
            argv.push(net);
        }

        if let Some(block) = args.block_devices.first() {
            argv.push("--disk".to_string());
            argv.push(format!("path={}", block.path.display()));
        }

        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uruncio_core::MonitorBlockArgs;

    #[test]
    fn builds_minimal_argv() {
        let monitor = CloudHypervisor::new(PathBuf::from("/usr/bin/cloud-hypervisor"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            container: "c0".into(),
            unikernel_path: PathBuf::from("/boot/unikernel.bin"),
            command: "--verbose".into(),
            ..Default::default()
        });
        assert!(argv.contains(&"--kernel".to_string()));
        assert!(argv.contains(&"/boot/unikernel.bin".to_string()));
        assert!(argv.contains(&"size=256M".to_string()));
        assert!(!argv.contains(&"--net".to_string()));
    }

    #[test]
    fn builds_argv_with_net_and_disk() {
        let monitor = CloudHypervisor::new(PathBuf::from("/usr/bin/cloud-hypervisor"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            container: "c0".into(),
            tap_device: "tap0".into(),
            guest_mac: "02:00:00:00:00:01".into(),
            block_devices: vec![MonitorBlockArgs {
                id: "rootfs".into(),
                path: PathBuf::from("/dev/sda"),
            }],
            ..Default::default()
        });
        assert!(argv.windows(2).any(|w| w == ["--net", "tap=tap0,mac=02:00:00:00:00:01"]));
        assert!(argv.windows(2).any(|w| w == ["--disk", "path=/dev/sda"]));
    }
}
