// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The capability every monitor (hypervisor) adapter implements,
//! grounded on `original_source/pkg/unikontainers/hypervisors`'s `Vmm`
//! interface.

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use uruncio_core::MonitorExecArgs;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to execve into monitor binary {path}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait MonitorAdapter {
    fn binary_path(&self) -> &Path;

    /// Builds the full argv (including argv[0]) for this monitor.
    fn build_argv(&self, args: &MonitorExecArgs) -> Vec<String>;

    /// Whether this monitor requires hardware virtualization via `/dev/kvm`.
    /// Used to decide whether the device node is created in MonRootfs.
    fn uses_kvm(&self) -> bool {
        false
    }

    /// Replaces the current process image with the monitor binary.
    /// Returns only on failure, since success never returns.
    fn exec(&self, args: &MonitorExecArgs) -> Result<(), MonitorError> {
        let argv = self.build_argv(args);
        tracing::debug!(monitor = ?self.binary_path(), ?argv, "ready to execve monitor");
        let mut command = Command::new(self.binary_path());
        if argv.len() > 1 {
            command.args(&argv[1..]);
        }
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
