// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The QEMU adapter. QEMU is not KVM-only, so it always accepts a
//! network/block config the way `cloud_hypervisor.go` shows; argument
//! names follow QEMU's own `-kernel`/`-append`/`-netdev`/`-drive`
//! conventions instead of cloud-hypervisor's `--kernel=`-style flags.

use crate::adapter::MonitorAdapter;
use crate::utils::resolve_memory_mb;
use std::path::{Path, PathBuf};
use uruncio_core::MonitorExecArgs;

pub const QEMU_VMM: &str = "qemu";

pub struct Qemu {
    binary_path: PathBuf,
}

impl Qemu {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

impl MonitorAdapter for Qemu {
    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn build_argv(&self, args: &MonitorExecArgs) -> Vec<String> {
        let mem = resolve_memory_mb(args.mem_size_bytes);
        let vcpus = if args.vcpus == 0 { 1 } else { args.vcpus };

        let mut argv = vec![
            self.binary_path.display().to_string(),
            "-nographic".to_string(),
            "-m".to_string(),
            mem.to_string(),
            "-smp".to_string(),
            vcpus.to_string(),
            "-kernel".to_string(),
            args.unikernel_path.display().to_string(),
            "-append".to_string(),
            args.command.clone(),
        ];

        if !args.tap_device.is_empty() {
            argv.push("-netdev".to_string());
            argv.push(format!("tap,id=net0,ifname={},script=no,downscript=no", args.tap_device));
            argv.push("-device".to_string());
            let mac = if args.guest_mac.is_empty() {
                String::new()
            } else {
                format!(",mac={}", args.guest_mac)
            };
            argv.push(format!("virtio-net-pci,netdev=net0{mac}"));
        }

        for block in &args.block_devices {
            argv.push("-drive".to_string());
            argv.push(format!("file={},format=raw,if=virtio", block.path.display()));
        }

        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_minimal_argv() {
        let monitor = Qemu::new(PathBuf::from("/usr/bin/qemu-system-x86_64"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            unikernel_path: PathBuf::from("/boot/unikernel.bin"),
            ..Default::default()
        });
        assert!(argv.contains(&"-kernel".to_string()));
        assert!(argv.contains(&"256".to_string()));
        assert!(argv.contains(&"1".to_string()));
    }

    #[test]
    fn includes_netdev_when_tap_set() {
        let monitor = Qemu::new(PathBuf::from("/usr/bin/qemu-system-x86_64"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            tap_device: "tap0".into(),
            ..Default::default()
        });
        assert!(argv.iter().any(|a| a.contains("ifname=tap0")));
    }
}
