// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The Solo5 `hvt` tender adapter. Unlike qemu and cloud-hypervisor, the
//! tenders don't take generic `-net`/`-disk` flags: network and block
//! wiring is rendered by the unikernel adapter itself (see `mirage.rs`'s
//! and `rumprun.rs`'s `monitor_net_cli`/`monitor_block_cli`) into tokens
//! like `--net:service=tap0` and `--disk:storage=/dev/vol0`, and arrives
//! here pre-built in [`MonitorExecArgs::extra_cli`] and `block_devices`.

use crate::adapter::MonitorAdapter;
use std::path::{Path, PathBuf};
use uruncio_core::MonitorExecArgs;

pub const HVT_VMM: &str = "hvt";

pub struct Hvt {
    binary_path: PathBuf,
}

impl Hvt {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

impl MonitorAdapter for Hvt {
    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn uses_kvm(&self) -> bool {
        true
    }

    fn build_argv(&self, args: &MonitorExecArgs) -> Vec<String> {
        let mut argv = vec![self.binary_path.display().to_string()];

        argv.extend(args.extra_cli.iter().cloned());

        for block in &args.block_devices {
            argv.push(format!("--disk:{}={}", block.id, block.path.display()));
        }

        argv.push(args.unikernel_path.display().to_string());

        if !args.command.is_empty() {
            argv.extend(args.command.split_whitespace().map(str::to_string));
        }

        argv
    }
}
