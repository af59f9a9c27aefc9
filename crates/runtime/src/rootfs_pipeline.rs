// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Resolves the container rootfs into a single guest block device (or
//! none), grounded on
//! `original_source/pkg/unikontainers/block.go`'s `handleBlockBasedRootfs`
//! and `handleContainerRootfs`.
//!
//! Three cases, matched in order:
//!
//! 1. An explicit block image annotation was set: the caller already has
//!    a `BlockDevParams` for it (see [`uruncio_rootfs::handle_explicit_block_image`]);
//!    this module passes it through unchanged.
//! 2. No explicit annotation, but the container's own rootfs is itself a
//!    mounted block device: the unikernel binary, optional initrd, and
//!    `urunc.json` manifest are relocated into `mon_rootfs`, the original
//!    mount is unmounted, and the underlying device is promoted to the
//!    guest rootfs. Rumprun refuses to mount its rootfs at `/`, so its
//!    guest mount point is `/data` instead.
//! 3. Neither applies: there is no block rootfs and the guest boots from
//!    its embedded image alone.

use std::path::Path;

use nix::mount::umount;
use uruncio_core::rootfs::{BlockDevParams, ROOTFS_DEVICE_ID};
use uruncio_rootfs::find_mount_at;

use crate::error::RuntimeError;

const RUMPRUN_ROOTFS_MOUNT_POINT: &str = "/data";
const DEFAULT_ROOTFS_MOUNT_POINT: &str = "/";

/// Artifacts the reexec child must see under `mon_rootfs` once the
/// original container rootfs mount has been torn down.
pub struct RelocatedArtifacts<'a> {
    pub unikernel_binary: &'a Path,
    pub initrd: Option<&'a Path>,
    pub manifest: Option<&'a Path>,
}

/// Resolves the container rootfs block device per the three cases above.
///
/// `explicit` is `Some` only when an explicit block image annotation was
/// present; `container_root_mount` is the guest-visible mount point the
/// container engine attached the bundle rootfs at (normally `/`), looked
/// up in `mountinfo_path` (normally `/proc/self/mountinfo`).
pub fn resolve_rootfs_block(
    explicit: Option<BlockDevParams>,
    container_root_mount: &str,
    mountinfo_path: &Path,
    mon_rootfs: &Path,
    artifacts: RelocatedArtifacts<'_>,
    rumprun: bool,
) -> Result<Option<BlockDevParams>, RuntimeError> {
    if let Some(block) = explicit {
        return Ok(Some(block));
    }

    let mount = match find_mount_at(mountinfo_path, container_root_mount) {
        Ok(mount) => mount,
        Err(uruncio_rootfs::MountInfoError::NotAMountPoint(_)) => return Ok(None),
        Err(other) => return Err(other.into()),
    };

    relocate_into(mon_rootfs, &artifacts)?;
    umount(container_root_mount).map_err(|source| RuntimeError::Umount {
        path: container_root_mount.into(),
        source,
    })?;

    let mount_point = if rumprun {
        RUMPRUN_ROOTFS_MOUNT_POINT
    } else {
        DEFAULT_ROOTFS_MOUNT_POINT
    };

    Ok(Some(BlockDevParams {
        source: mount.source,
        fs_type: mount.fs_type,
        mount_point: mount_point.to_string(),
        id: ROOTFS_DEVICE_ID.to_string(),
    }))
}

fn relocate_into(mon_rootfs: &Path, artifacts: &RelocatedArtifacts<'_>) -> Result<(), RuntimeError> {
    std::fs::create_dir_all(mon_rootfs)?;
    relocate_one(mon_rootfs, artifacts.unikernel_binary)?;
    if let Some(initrd) = artifacts.initrd {
        relocate_one(mon_rootfs, initrd)?;
    }
    if let Some(manifest) = artifacts.manifest {
        relocate_one(mon_rootfs, manifest)?;
    }
    Ok(())
}

fn relocate_one(mon_rootfs: &Path, source: &Path) -> Result<(), RuntimeError> {
    let Some(name) = source.file_name() else {
        return Ok(());
    };
    std::fs::rename(source, mon_rootfs.join(name))?;
    Ok(())
}
