// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Rootfs and block device parameters, grounded on
//! `original_source/pkg/unikontainers/block.go`'s `types.RootfsParams`
//! and `types.BlockDevParams`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The reserved block device ID for the container rootfs. At most one
/// entry in a guest's block list may carry this ID.
pub const ROOTFS_DEVICE_ID: &str = "rootfs";

/// Describes how the container rootfs maps onto the guest's rootfs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootfsParams {
    /// Host path of the device or file to be presented to the guest as
    /// its rootfs.
    pub path: PathBuf,
    /// Where the container engine mounted that device, if any. If
    /// non-empty, the preparer must leave `mon_rootfs` populated and
    /// `mounted_path` unmounted before the monitor runs.
    #[serde(default)]
    pub mounted_path: PathBuf,
    /// Host directory that will be the monitor's own rootfs.
    pub mon_rootfs: PathBuf,
}

/// One block device to be exposed to the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevParams {
    /// Host device path.
    pub source: PathBuf,
    /// Guest filesystem type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    /// Guest-visible mount point.
    pub mount_point: String,
    /// Logical tag used by the monitor/unikernel adapters.
    /// `rootfs` is reserved and appears at most once per guest.
    pub id: String,
}

impl BlockDevParams {
    pub fn is_rootfs(&self) -> bool {
        self.id == ROOTFS_DEVICE_ID
    }
}

/// Checks the invariant that at most one block device in `devices`
/// carries the reserved `rootfs` ID.
pub fn has_unique_rootfs_id(devices: &[BlockDevParams]) -> bool {
    devices.iter().filter(|d| d.is_rootfs()).count() <= 1
}
