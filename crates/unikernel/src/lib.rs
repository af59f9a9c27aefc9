// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Unikernel family adapters and the Solo5 manifest reader, grounded on
//! `original_source/pkg/unikontainers/unikernels/mirage.go` and
//! `rumprun.go`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapter;
pub mod mirage;
pub mod rumprun;
pub mod solo5_manifest;

pub use adapter::{CommandStringError, UnikernelAdapter, UnikernelParams};
pub use mirage::Mirage;
pub use rumprun::Rumprun;
pub use solo5_manifest::{parse_manifest, parse_manifest_from_file, Solo5ParseError};

/// Builds the adapter for `unikernel_type`, or `None` if unrecognized.
pub fn adapter_for(unikernel_type: &str) -> Option<Box<dyn UnikernelAdapter>> {
    match unikernel_type {
        mirage::MIRAGE_UNIKERNEL => Some(Box::new(Mirage::default())),
        rumprun::RUMPRUN_UNIKERNEL => Some(Box::new(Rumprun::default())),
        _ => None,
    }
}
