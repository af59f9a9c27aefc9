// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Bind mount ingestion, grounded on
//! `original_source/pkg/unikontainers/block.go`'s `copyMountfiles` and
//! `getBlockVolumes`.

use std::path::{Path, PathBuf};
use thiserror::Error;

use uruncio_core::rootfs::BlockDevParams;

use crate::mountinfo::{find_mount_at, MountInfoError};

/// One entry from the container spec's mount list. Only `is_bind`
/// entries are ever copied or promoted; the index of an entry within
/// the full list (bind and non-bind alike) is what numbers a promoted
/// volume's `vol{index}` ID, matching the original mount array's
/// ordering.
#[derive(Debug, Clone)]
pub struct MountEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub is_bind: bool,
}

#[derive(Debug, Error)]
pub enum MountIngestError {
    #[error(transparent)]
    MountInfo(#[from] MountInfoError),
    #[error("failed to unmount {path}: {source}")]
    Unmount {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
}

/// Copies every bind mount's source into `mon_rootfs` at its
/// destination. A failed copy is the soft `ErrCopyDir` case: logged and
/// skipped rather than propagated, since block promotion below is
/// attempted independently of whether the file copy succeeded.
pub fn copy_bind_mounts(mounts: &[MountEntry], mon_rootfs: &Path) {
    for mount in mounts.iter().filter(|m| m.is_bind) {
        let target = join_under(mon_rootfs, &mount.destination);
        if let Err(err) = copy_path(&mount.source, &target) {
            tracing::warn!(
                source = %mount.source.display(),
                destination = %target.display(),
                error = %err,
                "skipping bind mount copy"
            );
        }
    }
}

/// Promotes every bind mount whose source is itself a mounted block
/// device the unikernel adapter supports. Mounts absent from mountinfo
/// are the soft `ErrMountpoint` case and are skipped; any other
/// mountinfo error is fatal. Device node creation for the promoted
/// entries is left to the caller's final [`crate::populate_dev_nodes`]
/// pass over the assembled device list.
pub fn promote_block_mounts(
    mounts: &[MountEntry],
    mountinfo_path: &Path,
    supports_fs: &dyn Fn(&str) -> bool,
) -> Result<Vec<(usize, BlockDevParams)>, MountIngestError> {
    let mut promoted = Vec::new();
    for (index, mount) in mounts.iter().enumerate() {
        if !mount.is_bind {
            continue;
        }

        let source_str = mount.source.to_string_lossy();
        let mut info = match find_mount_at(mountinfo_path, &source_str) {
            Ok(info) => info,
            Err(MountInfoError::NotAMountPoint(_)) => continue,
            Err(err) => return Err(err.into()),
        };

        let fs_type = info.fs_type.clone().unwrap_or_default();
        if !supports_fs(&fs_type) {
            continue;
        }

        nix::mount::umount(&mount.source).map_err(|source_err| MountIngestError::Unmount {
            path: mount.source.clone(),
            source: source_err,
        })?;

        info.mount_point = mount.destination.to_string_lossy().into_owned();
        promoted.push((index, info));
    }
    Ok(promoted)
}

fn join_under(mon_rootfs: &Path, destination: &Path) -> PathBuf {
    let relative = destination.strip_prefix("/").unwrap_or(destination);
    mon_rootfs.join(relative)
}

fn copy_path(source: &Path, dest: &Path) -> std::io::Result<()> {
    let metadata = std::fs::metadata(source)?;
    if metadata.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_path(&entry.path(), &dest.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, dest).map(|_| ())
    }
}
