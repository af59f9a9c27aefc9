// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! uruncio-core: shared data model for the uruncio unikernel runtime shim.
//!
//! Every on-disk and on-wire type the other crates exchange lives here:
//! the container identifier, the persisted state record, rootfs/block/
//! network parameters, the Solo5 manifest shape, the fixed timestamp
//! schema, and the handoff message enum.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod annotations;
pub mod handoff;
pub mod id;
pub mod monitor_args;
pub mod network;
pub mod rootfs;
pub mod solo5;
pub mod state;
pub mod timestamp;

pub use handoff::HandoffMessage;
pub use id::ContainerId;
pub use monitor_args::{MonitorBlockArgs, MonitorCliArgs, MonitorExecArgs};
pub use network::NetworkParams;
pub use rootfs::{BlockDevParams, RootfsParams, ROOTFS_DEVICE_ID};
pub use solo5::{DeviceType, Solo5Entry, Solo5Manifest};
pub use state::{Status, StateRecord, UnikernelConfig};
pub use timestamp::{MetricsWriter, TimestampId, TimestampMeta, TIMESTAMPS};
