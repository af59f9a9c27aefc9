// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Shared argument shapes passed from a unikernel adapter to a monitor
//! adapter, grounded on `original_source/pkg/unikontainers/types`'s
//! `MonitorBlockArgs` and `MonitorCliArgs`.

use std::path::PathBuf;

/// One block device a unikernel adapter wants the monitor to attach,
/// addressed by the guest-visible ID the unikernel itself expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorBlockArgs {
    pub id: String,
    pub path: PathBuf,
}

/// Extra monitor command-line tokens a unikernel adapter needs beyond
/// the network and block options the monitor already knows how to
/// build. Most adapters return an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorCliArgs {
    pub extra_args: Vec<String>,
}

/// Resolved inputs a monitor adapter needs to build its argv and
/// `execve` into the hypervisor binary, grounded on
/// `original_source/pkg/unikontainers/hypervisors`'s `ExecArgs`.
#[derive(Debug, Clone, Default)]
pub struct MonitorExecArgs {
    pub container: String,
    pub mem_size_bytes: u64,
    pub vcpus: u32,
    pub unikernel_path: PathBuf,
    pub command: String,
    pub tap_device: String,
    pub guest_mac: String,
    pub block_devices: Vec<MonitorBlockArgs>,
    pub environment: Vec<String>,
    /// Extra tokens a unikernel adapter renders itself, such as the
    /// `--net:service=`/`--net-mac:service=` pairs Solo5 tenders expect.
    /// Qemu and cloud-hypervisor ignore this and build their own network
    /// flags from `tap_device`/`guest_mac` instead.
    pub extra_cli: Vec<String>,
}
