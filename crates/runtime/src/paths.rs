// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Per-container directory layout under the runtime's `--root`.

use std::path::{Path, PathBuf};
use uruncio_ipc::{ACK_SOCKET_NAME, REEXEC_SOCKET_NAME, START_SOCKET_NAME};

/// `<root>/<id>`.
pub fn container_dir(root: &Path, id: &str) -> PathBuf {
    root.join(id)
}

pub fn reexec_socket_path(root: &Path, id: &str) -> PathBuf {
    container_dir(root, id).join(REEXEC_SOCKET_NAME)
}

pub fn start_socket_path(root: &Path, id: &str) -> PathBuf {
    container_dir(root, id).join(START_SOCKET_NAME)
}

pub fn ack_socket_path(root: &Path, id: &str) -> PathBuf {
    container_dir(root, id).join(ACK_SOCKET_NAME)
}

/// `<root>/<id>/rootfs` — the monitor's own rootfs directory, built up
/// by the reexec child before the final `execve`.
pub fn mon_rootfs_dir(root: &Path, id: &str) -> PathBuf {
    container_dir(root, id).join("rootfs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_under_the_container_directory() {
        let root = Path::new("/run/uruncio");
        assert_eq!(container_dir(root, "c0"), PathBuf::from("/run/uruncio/c0"));
        assert_eq!(
            reexec_socket_path(root, "c0"),
            PathBuf::from("/run/uruncio/c0/uruncio.sock")
        );
        assert_eq!(
            start_socket_path(root, "c0"),
            PathBuf::from("/run/uruncio/c0/start.sock")
        );
        assert_eq!(
            ack_socket_path(root, "c0"),
            PathBuf::from("/run/uruncio/c0/ack.sock")
        );
        assert_eq!(mon_rootfs_dir(root, "c0"), PathBuf::from("/run/uruncio/c0/rootfs"));
    }
}
