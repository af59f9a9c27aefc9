// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Monitor (hypervisor) adapters, grounded on
//! `original_source/pkg/unikontainers/hypervisors/cloud_hypervisor.go`
//! and `utils.go`. Each adapter builds an argv for its hypervisor binary
//! and `execve`s into it, becoming the container's monitor process.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapter;
pub mod cloud_hypervisor;
pub mod firecracker;
pub mod hvt;
pub mod process;
pub mod qemu;
pub mod spt;
pub mod utils;

pub use adapter::{MonitorAdapter, MonitorError};
pub use cloud_hypervisor::CloudHypervisor;
pub use firecracker::Firecracker;
pub use hvt::Hvt;
pub use process::{is_alive, kill_and_wait, ProcessError};
pub use qemu::Qemu;
pub use spt::Spt;

/// Builds the adapter for `hypervisor`, or `None` if unrecognized.
pub fn adapter_for(hypervisor: &str, binary_path: std::path::PathBuf) -> Option<Box<dyn MonitorAdapter>> {
    match hypervisor {
        qemu::QEMU_VMM => Some(Box::new(Qemu::new(binary_path))),
        firecracker::FIRECRACKER_VMM => Some(Box::new(Firecracker::new(binary_path))),
        cloud_hypervisor::CLOUD_HYPERVISOR_VMM => Some(Box::new(CloudHypervisor::new(binary_path))),
        hvt::HVT_VMM => Some(Box::new(Hvt::new(binary_path))),
        spt::SPT_VMM => Some(Box::new(Spt::new(binary_path))),
        _ => None,
    }
}
