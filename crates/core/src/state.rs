// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The persisted per-container record, grounded on
//! `original_source/pkg/unikontainers/unikontainers.go`'s in-memory
//! `Unikontainer` plus its `State` JSON sidecar. `uruncio-state` owns
//! reading and writing this record atomically; this crate only defines
//! its shape.

use crate::network::NetworkParams;
use crate::rootfs::{BlockDevParams, RootfsParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container lifecycle status, as reported by the `state` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Created,
    Running,
    Stopped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Running => "running",
            Status::Stopped => "stopped",
        }
    }
}

/// The unikernel-specific half of a container's configuration: which
/// family and monitor to use, the guest artifacts, and the resources
/// assembled for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnikernelConfig {
    /// `mirage`, `rumprun`, and so on.
    pub unikernel_type: String,
    /// `qemu`, `firecracker`, `cloud-hypervisor`, `hvt`, `spt`.
    pub hypervisor: String,
    /// Path to the unikernel binary inside the bundle.
    pub unikernel_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initrd_path: Option<PathBuf>,
    #[serde(default)]
    pub cmdline: String,
    #[serde(default)]
    pub rootfs: RootfsParams,
    #[serde(default)]
    pub block_devices: Vec<BlockDevParams>,
    #[serde(default)]
    pub network: NetworkParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccel_rpc_address: Option<String>,
}

/// The full persisted record for one container, serialized as
/// `state.json` inside the container's state directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: String,
    pub bundle: PathBuf,
    /// The bundle's `config.json`, carried inline so `state` can report
    /// the container spec without re-reading a bundle directory that
    /// may have since been removed.
    #[serde(default)]
    pub container_spec: serde_json::Value,
    pub status: Status,
    /// PID of the monitor process once `start` has handed off, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_pid: Option<i32>,
    /// Milliseconds since the Unix epoch when this record was created.
    pub created_at: u64,
    /// Schema version of this record, bumped on incompatible layout
    /// changes so `uruncio-state` can refuse or migrate stale records.
    pub spec_version: u32,
    #[serde(default)]
    pub annotations: std::collections::BTreeMap<String, String>,
    pub unikernel: UnikernelConfig,
}

/// Current on-disk schema version written by this build.
pub const CURRENT_SPEC_VERSION: u32 = 1;

impl StateRecord {
    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateRecord {
        StateRecord {
            id: "c0".into(),
            bundle: PathBuf::from("/bundles/c0"),
            container_spec: serde_json::json!({"ociVersion": "1.0.2"}),
            status: Status::Created,
            monitor_pid: None,
            created_at: 1_700_000_000_000,
            spec_version: CURRENT_SPEC_VERSION,
            annotations: Default::default(),
            unikernel: UnikernelConfig::default(),
        }
    }

    #[test]
    fn round_trips_through_json() {
        let record = sample();
        let encoded = serde_json::to_string(&record).expect("serialize");
        let decoded: StateRecord = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(record, decoded);
    }

    #[test]
    fn status_renders_lowercase() {
        let record = sample();
        let encoded = serde_json::to_string(&record).expect("serialize");
        assert!(encoded.contains("\"status\":\"created\""));
    }

    #[test]
    fn is_running_reflects_status() {
        let mut record = sample();
        assert!(!record.is_running());
        record.status = Status::Running;
        assert!(record.is_running());
    }
}
