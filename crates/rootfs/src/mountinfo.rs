// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! `/proc/self/mountinfo` lookup, grounded on
//! `original_source/pkg/unikontainers/block.go`'s `getMountInfo`.

use std::io::BufRead;
use std::path::Path;
use thiserror::Error;
use uruncio_core::rootfs::BlockDevParams;

#[derive(Debug, Error)]
pub enum MountInfoError {
    #[error("failed to read mountinfo: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid mountinfo line: {0}")]
    InvalidLine(String),
    #[error("{0} is not a mount point")]
    NotAMountPoint(String),
}

/// Scans a mountinfo document for the entry whose mount point is
/// `path`, returning its source device and filesystem type.
///
/// Each line looks like:
/// `36 35 98:0 /mnt1 /mnt2 rw,noatime master:1 - ext3 /dev/root rw,errors=continue`
/// with a literal ` - ` separating the fixed fields from the
/// filesystem-specific fields used here.
pub fn find_mount(reader: impl BufRead, path: &str) -> Result<BlockDevParams, MountInfoError> {
    for line in reader.lines() {
        let line = line?;
        let parts: Vec<&str> = line.splitn(2, " - ").collect();
        if parts.len() != 2 {
            return Err(MountInfoError::InvalidLine(line));
        }
        let fields: Vec<&str> = parts[0].split_whitespace().collect();
        if fields.len() < 5 || fields[4] != path {
            continue;
        }
        let fs_fields: Vec<&str> = parts[1].split_whitespace().collect();
        if fs_fields.len() < 2 {
            continue;
        }
        return Ok(BlockDevParams {
            source: fs_fields[1].into(),
            fs_type: Some(fs_fields[0].to_string()),
            mount_point: path.to_string(),
            id: String::new(),
        });
    }
    Err(MountInfoError::NotAMountPoint(path.to_string()))
}

pub fn find_mount_at(mountinfo_path: &Path, path: &str) -> Result<BlockDevParams, MountInfoError> {
    let file = std::fs::File::open(mountinfo_path)?;
    find_mount(std::io::BufReader::new(file), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
36 35 98:0 / /mnt1 rw,noatime master:1 - ext3 /dev/root rw,errors=continue\n\
37 35 98:1 / /var/lib/docker/volumes/vol0 rw - ext4 /dev/sdb1 rw\n";

    #[test]
    fn finds_a_known_mount_point() {
        let found = find_mount(Cursor::new(SAMPLE), "/mnt1").unwrap();
        assert_eq!(found.source.to_str(), Some("/dev/root"));
        assert_eq!(found.fs_type.as_deref(), Some("ext3"));
    }

    #[test]
    fn returns_not_a_mount_point_when_absent() {
        let err = find_mount(Cursor::new(SAMPLE), "/not/mounted").unwrap_err();
        assert!(matches!(err, MountInfoError::NotAMountPoint(_)));
    }

    #[test]
    fn rejects_malformed_line() {
        let err = find_mount(Cursor::new("no separator here\n"), "/mnt1").unwrap_err();
        assert!(matches!(err, MountInfoError::InvalidLine(_)));
    }
}
