// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The Rumprun adapter, grounded on
//! `original_source/pkg/unikontainers/unikernels/rumprun.go`.
//!
//! Rumprun's boot configuration looks like JSON but isn't quite: each
//! fragment (`cmdline`, `env`, `net`, `blk`) is serialized independently
//! and stitched together by hand, because the upstream config parser
//! rejects a couple of forms a generic encoder would produce. We keep
//! that same stitching here instead of reshaping it into one struct,
//! since the wire format is what Rumprun actually expects.

use crate::adapter::{CommandStringError, UnikernelAdapter, UnikernelParams};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use uruncio_core::{MonitorBlockArgs, MonitorCliArgs};

pub const RUMPRUN_UNIKERNEL: &str = "rumprun";
const SUBNET_MASK_125: &str = "128.0.0.0";

#[derive(Debug, Error)]
pub enum SubnetMaskError {
    #[error("malformed subnet mask {0}")]
    Malformed(String),
}

/// Counts the number of set bits in a dotted-quad subnet mask, giving
/// the CIDR prefix length Rumprun's config format expects.
pub fn subnet_mask_to_cidr(mask: &str) -> Result<u32, SubnetMaskError> {
    let octets: Vec<u8> = mask
        .split('.')
        .map(|part| part.parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| SubnetMaskError::Malformed(mask.to_string()))?;
    if octets.len() != 4 {
        return Err(SubnetMaskError::Malformed(mask.to_string()));
    }
    Ok(octets.iter().map(|b| b.count_ones()).sum())
}

#[derive(Serialize)]
struct RumprunCmd {
    cmdline: String,
}

#[derive(Serialize)]
struct RumprunEnv {
    env: String,
}

#[derive(Serialize, Default)]
struct RumprunNet {
    #[serde(rename = "if")]
    interface: String,
    cloner: String,
    #[serde(rename = "type")]
    net_type: String,
    method: String,
    addr: String,
    mask: String,
    gw: String,
}

#[derive(Serialize, Default)]
struct RumprunBlk {
    #[serde(skip)]
    host_path: PathBuf,
    source: String,
    path: String,
    fstype: String,
    mountpoint: String,
}

#[derive(Debug, Default)]
pub struct Rumprun {
    command: String,
    monitor: String,
    envs: Vec<String>,
    net: RumprunNetState,
    blk: RumprunBlkState,
}

#[derive(Debug, Default)]
struct RumprunNetState {
    address: String,
    inner: RumprunNetFields,
}

#[derive(Debug, Default, Clone)]
struct RumprunNetFields {
    interface: String,
    cloner: String,
    net_type: String,
    method: String,
    mask: String,
    gateway: String,
}

#[derive(Debug, Default)]
struct RumprunBlkState {
    source: String,
    path: String,
    fstype: String,
    mountpoint: String,
    host_path: PathBuf,
}

impl UnikernelAdapter for Rumprun {
    fn init(&mut self, params: &UnikernelParams) {
        if params.network.is_enabled() {
            let cidr = subnet_mask_to_cidr(SUBNET_MASK_125).unwrap_or(1);
            self.net = RumprunNetState {
                address: params.network.ip.clone(),
                inner: RumprunNetFields {
                    interface: "ukvmif0".to_string(),
                    cloner: "True".to_string(),
                    net_type: "inet".to_string(),
                    method: "static".to_string(),
                    mask: cidr.to_string(),
                    gateway: params.network.gateway.clone(),
                },
            };
        } else {
            self.net = RumprunNetState::default();
        }

        if let Some(block) = params.block.first() {
            self.blk = RumprunBlkState {
                source: "etfs".to_string(),
                path: "/dev/ld0a".to_string(),
                fstype: "blk".to_string(),
                mountpoint: block.mount_point.clone(),
                host_path: block.source.clone(),
            };
        } else {
            self.blk = RumprunBlkState::default();
        }

        self.command = params.cmdline.join(" ");
        self.monitor = params.monitor.clone();
        self.envs = params.env_vars.clone();
    }

    fn command_string(&self) -> Result<String, CommandStringError> {
        let cmd_json = serde_json::to_string(&RumprunCmd {
            cmdline: self.command.clone(),
        })?;

        let mut env_fragment = String::new();
        for (index, env) in self.envs.iter().enumerate() {
            let one = serde_json::to_string(&RumprunEnv { env: env.clone() })?;
            let one = one
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .unwrap_or(&one);
            if index != 0 {
                env_fragment.push(',');
            }
            env_fragment.push_str(one);
        }

        let mut net_fragment = String::new();
        if !self.net.address.is_empty() {
            let net = RumprunNet {
                interface: self.net.inner.interface.clone(),
                cloner: self.net.inner.cloner.clone(),
                net_type: self.net.inner.net_type.clone(),
                method: self.net.inner.method.clone(),
                addr: self.net.address.clone(),
                mask: self.net.inner.mask.clone(),
                gw: self.net.inner.gateway.clone(),
            };
            net_fragment = format!("\"net\":{}", serde_json::to_string(&net)?);
        }

        let mut blk_fragment = String::new();
        if !self.blk.source.is_empty() {
            let blk = RumprunBlk {
                host_path: self.blk.host_path.clone(),
                source: self.blk.source.clone(),
                path: self.blk.path.clone(),
                fstype: self.blk.fstype.clone(),
                mountpoint: self.blk.mountpoint.clone(),
            };
            blk_fragment = format!("\"blk\":{}", serde_json::to_string(&blk)?);
        }

        let mut result = cmd_json
            .strip_suffix('}')
            .unwrap_or(&cmd_json)
            .to_string();
        if !env_fragment.is_empty() {
            result.push(',');
            result.push_str(&env_fragment);
        }
        if !net_fragment.is_empty() {
            result.push(',');
            result.push_str(&net_fragment);
        }
        if !blk_fragment.is_empty() {
            result.push(',');
            result.push_str(&blk_fragment);
        }
        result.push('}');
        Ok(result)
    }

    fn supports_block(&self) -> bool {
        true
    }

    fn supports_fs(&self, fs_type: &str) -> bool {
        fs_type == "ext2"
    }

    fn monitor_net_cli(&self, if_name: &str, mac: &str) -> String {
        match self.monitor.as_str() {
            "hvt" | "spt" => format!("--net:tap={if_name} --net-mac:tap={mac}"),
            _ => String::new(),
        }
    }

    fn monitor_block_cli(&self) -> Vec<MonitorBlockArgs> {
        match self.monitor.as_str() {
            "hvt" | "spt" => vec![MonitorBlockArgs {
                id: "rootfs".to_string(),
                path: self.blk.host_path.clone(),
            }],
            _ => Vec::new(),
        }
    }

    fn monitor_cli(&self) -> MonitorCliArgs {
        MonitorCliArgs::default()
    }
}
