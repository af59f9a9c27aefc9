// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The capability every unikernel family implements, grounded on
//! `original_source/pkg/unikontainers/types`'s `Unikernel` interface.

use std::collections::BTreeMap;
use uruncio_core::solo5::Solo5Manifest;
use uruncio_core::{BlockDevParams, MonitorBlockArgs, MonitorCliArgs, NetworkParams};

/// The inputs an adapter needs to resolve its guest command line and
/// monitor arguments.
#[derive(Debug, Clone, Default)]
pub struct UnikernelParams {
    pub cmdline: Vec<String>,
    pub monitor: String,
    pub network: NetworkParams,
    pub block: Vec<BlockDevParams>,
    pub env_vars: Vec<String>,
    /// Host tap interface name -> guest-visible device name, parsed from
    /// the `urunc.dev/mirage-net-map` annotation. Only consulted by the
    /// Mirage adapter.
    pub net_device_map: BTreeMap<String, String>,
    /// Host block ID -> guest-visible device name, parsed from the
    /// `urunc.dev/mirage-block-map` annotation. Only consulted by the
    /// Mirage adapter.
    pub block_device_map: BTreeMap<String, String>,
    /// The unikernel binary's Solo5 manifest, parsed at init time. Only
    /// consulted by the Mirage adapter, as the second step of device
    /// name resolution when no map annotation supplies a name.
    pub manifest: Option<Solo5Manifest>,
}

/// Family-specific behaviour needed to boot and configure a unikernel
/// on top of a given monitor.
pub trait UnikernelAdapter {
    /// Consumes the resolved container parameters and configures this
    /// adapter's internal state for the upcoming boot.
    fn init(&mut self, params: &UnikernelParams);

    /// The guest-visible command line / boot configuration string
    /// passed to the monitor.
    fn command_string(&self) -> Result<String, CommandStringError>;

    fn supports_block(&self) -> bool;

    fn supports_fs(&self, fs_type: &str) -> bool;

    /// Extra monitor network CLI fragment for the given tap interface
    /// and guest MAC, or empty if this monitor needs none from the
    /// unikernel's perspective.
    fn monitor_net_cli(&self, if_name: &str, mac: &str) -> String;

    fn monitor_block_cli(&self) -> Vec<MonitorBlockArgs>;

    fn monitor_cli(&self) -> MonitorCliArgs;
}

#[derive(Debug, thiserror::Error)]
pub enum CommandStringError {
    #[error("failed to encode unikernel command string: {0}")]
    Encode(#[from] serde_json::Error),
}
