// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! `/dev` node population inside the monitor's rootfs, grounded on
//! `original_source/pkg/unikontainers/block.go`'s `setupDev` calls. Each
//! block source is `stat`'d on the host and a matching block special
//! file is created under `<mon_rootfs>/dev` so the monitor sees the
//! same device major/minor pair without needing to share `/dev` itself.

use nix::errno::Errno;
use nix::sys::stat::{mknod, stat, Mode, SFlag};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uruncio_core::rootfs::BlockDevParams;

#[derive(Debug, Error)]
pub enum DevNodeError {
    #[error("failed to stat block source {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: Errno,
    },
    #[error("{path} is not the expected device type")]
    WrongDeviceType { path: PathBuf },
    #[error("failed to create device node {path}: {source}")]
    Mknod {
        path: PathBuf,
        #[source]
        source: Errno,
    },
    #[error("failed to create {0}")]
    CreateDir(PathBuf, #[source] std::io::Error),
}

const BLOCK_DEVICE_MODE: Mode = Mode::from_bits_truncate(0o660);
const CHAR_DEVICE_MODE: Mode = Mode::from_bits_truncate(0o666);

/// Creates a block special file at `<mon_rootfs>/dev/<basename-of-source>`
/// for every entry in `devices`, matching the source's major/minor
/// numbers via `stat(2)`.
pub fn populate_dev_nodes(mon_rootfs: &Path, devices: &[BlockDevParams]) -> Result<(), DevNodeError> {
    let dev_dir = mon_rootfs.join("dev");
    std::fs::create_dir_all(&dev_dir).map_err(|e| DevNodeError::CreateDir(dev_dir.clone(), e))?;

    for device in devices {
        create_dev_node(&dev_dir, &device.source)?;
    }
    Ok(())
}

/// Creates the fixed, non-block device nodes a guest's `/dev` needs:
/// `/dev/null` unconditionally, `/dev/kvm` when the selected monitor
/// requires hardware virtualization, and `/dev/net/tun` when networking
/// was requested. Each is mirrored from the host's own node via
/// `stat(2)`, matching major/minor exactly.
pub fn populate_static_dev_nodes(mon_rootfs: &Path, uses_kvm: bool, needs_tun: bool) -> Result<(), DevNodeError> {
    let dev_dir = mon_rootfs.join("dev");
    std::fs::create_dir_all(&dev_dir).map_err(|e| DevNodeError::CreateDir(dev_dir.clone(), e))?;

    mirror_char_device(Path::new("/dev/null"), &dev_dir.join("null"))?;

    if uses_kvm {
        mirror_char_device(Path::new("/dev/kvm"), &dev_dir.join("kvm"))?;
    }

    if needs_tun {
        let net_dir = dev_dir.join("net");
        std::fs::create_dir_all(&net_dir).map_err(|e| DevNodeError::CreateDir(net_dir.clone(), e))?;
        mirror_char_device(Path::new("/dev/net/tun"), &net_dir.join("tun"))?;
    }

    Ok(())
}

/// Creates `/dev/vsock` and `/dev/vhost-vsock` for containers with a
/// resolved vsock-based vAccel configuration.
pub fn populate_vsock_dev_nodes(mon_rootfs: &Path) -> Result<(), DevNodeError> {
    let dev_dir = mon_rootfs.join("dev");
    std::fs::create_dir_all(&dev_dir).map_err(|e| DevNodeError::CreateDir(dev_dir.clone(), e))?;

    mirror_char_device(Path::new("/dev/vsock"), &dev_dir.join("vsock"))?;
    mirror_char_device(Path::new("/dev/vhost-vsock"), &dev_dir.join("vhost-vsock"))?;
    Ok(())
}

fn mirror_char_device(source: &Path, target: &Path) -> Result<(), DevNodeError> {
    let metadata = stat(source).map_err(|source_err| DevNodeError::Stat {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    let file_type = SFlag::from_bits_truncate(metadata.st_mode & libc::S_IFMT as u32);
    if file_type != SFlag::S_IFCHR {
        return Err(DevNodeError::WrongDeviceType {
            path: source.to_path_buf(),
        });
    }

    let _ = std::fs::remove_file(target);
    mknod(target, SFlag::S_IFCHR, CHAR_DEVICE_MODE, metadata.st_rdev).map_err(|source_err| DevNodeError::Mknod {
        path: target.to_path_buf(),
        source: source_err,
    })
}

fn create_dev_node(dev_dir: &Path, source: &Path) -> Result<(), DevNodeError> {
    let metadata = stat(source).map_err(|source_err| DevNodeError::Stat {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    let file_type = SFlag::from_bits_truncate(metadata.st_mode & libc::S_IFMT as u32);
    if file_type != SFlag::S_IFBLK {
        return Err(DevNodeError::WrongDeviceType {
            path: source.to_path_buf(),
        });
    }

    let name = source
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| source.to_path_buf());
    let target = dev_dir.join(name);

    let _ = std::fs::remove_file(&target);
    mknod(&target, SFlag::S_IFBLK, BLOCK_DEVICE_MODE, metadata.st_rdev).map_err(|source_err| {
        DevNodeError::Mknod {
            path: target.clone(),
            source: source_err,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_block_source() {
        let dir = tempfile::tempdir().unwrap();
        let regular_file = dir.path().join("not-a-device");
        std::fs::write(&regular_file, b"hello").unwrap();
        let dev_dir = dir.path().join("dev");
        let err = create_dev_node(&dev_dir, &regular_file).unwrap_err();
        assert!(matches!(err, DevNodeError::WrongDeviceType { .. }));
    }

    #[test]
    fn populate_creates_dev_directory_even_with_no_devices() {
        let dir = tempfile::tempdir().unwrap();
        populate_dev_nodes(dir.path(), &[]).unwrap();
        assert!(dir.path().join("dev").is_dir());
    }
}
