// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Solo5 manifest data shape, extracted from the ELF note section
//! `.note.solo5.manifest`. Immutable after load; the parser that builds
//! this from raw bytes lives in `uruncio-unikernel` since it is only
//! meaningful alongside the unikernel adapter that consumes it.

use serde::{Deserialize, Serialize};

/// One device entry declared by the unikernel's Solo5 manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solo5Entry {
    /// 1..64 printable characters matching `[A-Za-z0-9_]+`.
    pub name: String,
    pub device_type: DeviceType,
}

/// The Solo5 device type, decoded from the manifest's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    BlockBasic,
    NetBasic,
    Unknown(u64),
}

impl DeviceType {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            0 => DeviceType::BlockBasic,
            1 => DeviceType::NetBasic,
            other => DeviceType::Unknown(other),
        }
    }
}

/// An ordered list of device entries declared by a unikernel ELF binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solo5Manifest {
    pub entries: Vec<Solo5Entry>,
}

impl Solo5Manifest {
    /// The single entry of `device_type`, if there is exactly one.
    pub fn unique_of_type(&self, device_type: DeviceType) -> Option<&Solo5Entry> {
        let mut matches = self.entries.iter().filter(|e| e.device_type == device_type);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_types() {
        assert_eq!(DeviceType::from_raw(0), DeviceType::BlockBasic);
        assert_eq!(DeviceType::from_raw(1), DeviceType::NetBasic);
        assert_eq!(DeviceType::from_raw(7), DeviceType::Unknown(7));
    }

    #[test]
    fn unique_of_type_requires_exactly_one() {
        let manifest = Solo5Manifest {
            entries: vec![
                Solo5Entry { name: "service".into(), device_type: DeviceType::NetBasic },
                Solo5Entry { name: "storage".into(), device_type: DeviceType::BlockBasic },
            ],
        };
        assert_eq!(
            manifest.unique_of_type(DeviceType::NetBasic).map(|e| e.name.as_str()),
            Some("service")
        );

        let ambiguous = Solo5Manifest {
            entries: vec![
                Solo5Entry { name: "a".into(), device_type: DeviceType::BlockBasic },
                Solo5Entry { name: "b".into(), device_type: DeviceType::BlockBasic },
            ],
        };
        assert_eq!(ambiguous.unique_of_type(DeviceType::BlockBasic), None);
    }
}
