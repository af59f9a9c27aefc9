// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Orchestrates the container lifecycle (`create`, `start`, the reexec
//! child, `state`, `kill`, `delete`) on top of the smaller crates that
//! each own one concern: bundle parsing, state persistence, handoff
//! sockets, rootfs preparation, and the unikernel/monitor adapters.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bundle;
pub mod container;
pub mod create;
pub mod error;
pub mod paths;
pub mod query;
pub mod reexec;
pub mod rootfs_pipeline;
pub mod start;

pub use bundle::Bundle;
pub use create::{create, CreateRequest};
pub use error::RuntimeError;
pub use query::{delete, send_signal, state};
pub use start::{start, StartRequest};
