// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! vAccel RPC address resolution, grounded on
//! `original_source/pkg/unikontainers/vaccel.go`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::collections::BTreeMap;
use thiserror::Error;
use uruncio_core::annotations::{VACCEL, VACCEL_RPC_ADDRESS};

const CID_MIN: i64 = 3;
const CID_MAX: i64 = 99;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaccelError {
    #[error("vaccel is disabled")]
    Disabled,
    #[error("vaccel is enabled, but rpc address is not set")]
    MissingRpcAddress,
    #[error("unsupported hypervisor: {0:?}")]
    UnsupportedHypervisor(String),
    #[error("rpc address {0:?} does not match the expected format for {1}")]
    MalformedAddress(String, String),
}

/// A deterministic vsock guest CID derived from a container or VM ID,
/// landing in `[3, 99]` per the vsock reserved-CID range.
pub fn id_to_guest_cid(id: &str) -> i64 {
    let sum: i64 = id.chars().map(|c| c as i64).sum();
    const RANGE: i64 = CID_MAX - CID_MIN + 1;
    (sum.rem_euclid(RANGE)) + CID_MIN
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAddress {
    /// The RPC address to export to the guest. For firecracker this is
    /// rewritten to the canonical `vsock://2:<port>` form.
    pub rpc_address: String,
    /// Host directory holding the firecracker unix socket, to be
    /// bind-mounted into the guest rootfs. Empty for qemu.
    pub vsock_socket_dir: String,
}

/// Validates `rpc_address` against the format the given hypervisor
/// expects and, for firecracker, extracts the host socket directory
/// and rewrites the address to the vsock form the guest understands.
pub fn validate_vsock_address(
    rpc_address: &str,
    hypervisor: &str,
) -> Result<ValidatedAddress, VaccelError> {
    match hypervisor {
        "qemu" => {
            if is_qemu_vsock_address(rpc_address) {
                Ok(ValidatedAddress {
                    rpc_address: rpc_address.to_string(),
                    vsock_socket_dir: String::new(),
                })
            } else {
                Err(VaccelError::MalformedAddress(
                    rpc_address.to_string(),
                    hypervisor.to_string(),
                ))
            }
        }
        "firecracker" => parse_firecracker_address(rpc_address)
            .ok_or_else(|| VaccelError::MalformedAddress(rpc_address.to_string(), hypervisor.to_string())),
        other => Err(VaccelError::UnsupportedHypervisor(other.to_string())),
    }
}

fn is_qemu_vsock_address(address: &str) -> bool {
    let Some(rest) = address.strip_prefix("vsock://2:") else {
        return false;
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

fn parse_firecracker_address(address: &str) -> Option<ValidatedAddress> {
    let rest = address.strip_prefix("unix://")?;
    let suffix_marker = "/vaccel.sock_";
    let marker_pos = rest.rfind(suffix_marker)?;
    let dir = &rest[..marker_pos];
    let port = &rest[marker_pos + suffix_marker.len()..];
    if dir.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(ValidatedAddress {
        rpc_address: format!("vsock://2:{port}"),
        vsock_socket_dir: dir.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccelConfig {
    pub vaccel_type: String,
    pub vsock_socket_dir: String,
    pub rpc_address: String,
}

/// Resolves vAccel configuration from the bundle's annotations, mirroring
/// `resolveVAccelConfig`'s validation order: vAccel must be explicitly
/// requested, with a non-empty RPC address, and (for `vsock` type) an
/// address matching the selected hypervisor's expected format.
pub fn resolve_vaccel_config(
    hypervisor: &str,
    annotations: &BTreeMap<String, String>,
) -> Result<VaccelConfig, VaccelError> {
    let Some(vaccel_type) = annotations.get(VACCEL) else {
        return Err(VaccelError::Disabled);
    };
    let address = annotations.get(VACCEL_RPC_ADDRESS).cloned().unwrap_or_default();
    if address.is_empty() {
        return Err(VaccelError::MissingRpcAddress);
    }

    if vaccel_type == "vsock" {
        let validated = validate_vsock_address(&address, hypervisor)?;
        return Ok(VaccelConfig {
            vaccel_type: vaccel_type.clone(),
            vsock_socket_dir: validated.vsock_socket_dir,
            rpc_address: validated.rpc_address,
        });
    }

    Ok(VaccelConfig {
        vaccel_type: vaccel_type.clone(),
        vsock_socket_dir: String::new(),
        rpc_address: address,
    })
}
