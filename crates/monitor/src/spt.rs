// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The Solo5 `spt` (seccomp-sandboxed tender) adapter. Same CLI shape as
//! `hvt`, different binary; kept as its own type rather than an alias
//! because monitor selection dispatches on the hypervisor name, and
//! `spt`/`hvt` are distinct hypervisor annotations.

use crate::adapter::MonitorAdapter;
use std::path::{Path, PathBuf};
use uruncio_core::MonitorExecArgs;

pub const SPT_VMM: &str = "spt";

pub struct Spt {
    binary_path: PathBuf,
}

impl Spt {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

impl MonitorAdapter for Spt {
    fn binary_path(&self) -> &Path {
        &self.binary_path
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_minimal_argv() {
        let monitor = Spt::new(PathBuf::from("/usr/bin/solo5-spt"));
        let argv = monitor.build_argv(&MonitorExecArgs {
            unikernel_path: PathBuf::from("/boot/unikernel.spt"),
            ..Default::default()
        });
        assert_eq!(argv[0], "/usr/bin/solo5-spt");
        assert_eq!(argv[1], "/boot/unikernel.spt");
    }
}
