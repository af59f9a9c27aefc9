// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Block device list assembly, grounded on
//! `original_source/pkg/unikontainers/block.go`'s
//! `handleExplicitBlockImage`, `getBlockVolumes`, and
//! `handleBlockBasedRootfs`.

use std::path::PathBuf;
use thiserror::Error;
use uruncio_core::rootfs::{BlockDevParams, ROOTFS_DEVICE_ID};

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block device annotation was set without a mountpoint")]
    MissingMountpoint,
}

/// Builds the rootfs block entry when the container rootfs itself is a
/// block image (annotated mount point of `/`). The reserved `rootfs` ID
/// is assigned only when the mount point is the guest's root.
pub fn handle_explicit_block_image(
    block_image: Option<&PathBuf>,
    mount_point: &str,
) -> Result<Option<BlockDevParams>, BlockError> {
    let Some(source) = block_image else {
        return Ok(None);
    };
    if mount_point.is_empty() {
        return Err(BlockError::MissingMountpoint);
    }
    let id = if mount_point == "/" {
        ROOTFS_DEVICE_ID.to_string()
    } else {
        String::new()
    };
    Ok(Some(BlockDevParams {
        source: source.clone(),
        fs_type: None,
        mount_point: mount_point.to_string(),
        id,
    }))
}

/// Assigns the reserved rootfs ID to a freshly built rootfs block entry
/// when one is present (the guest may boot with no rootfs device at
/// all), then appends the extra block volumes found among the
/// container's bind mounts, numbering each `vol{index}` by its position
/// in the original mount list.
pub fn assemble_block_devices(
    rootfs_block: Option<BlockDevParams>,
    extra_volumes: Vec<(usize, BlockDevParams)>,
) -> Vec<BlockDevParams> {
    let mut devices = Vec::new();
    if let Some(mut rootfs_block) = rootfs_block {
        rootfs_block.id = ROOTFS_DEVICE_ID.to_string();
        devices.push(rootfs_block);
    }
    for (index, mut volume) in extra_volumes {
        volume.id = format!("vol{index}");
        devices.push(volume);
    }
    devices
}
