// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Well-known OCI annotation keys read from the bundle spec, grounded on
//! `original_source/pkg/unikontainers/unikontainers.go`'s annotation
//! table. Unknown annotation keys are ignored by every reader; these
//! constants exist so the readers and the documentation never drift.

pub const UNIKERNEL_TYPE: &str = "com.urunc.unikernel.unikernelType";
pub const HYPERVISOR: &str = "com.urunc.unikernel.hypervisor";
pub const UNIKERNEL_BINARY: &str = "com.urunc.unikernel.unikernel";
pub const INITRD: &str = "com.urunc.unikernel.initrd";
pub const CMDLINE: &str = "com.urunc.unikernel.cmdline";
pub const BLOCK: &str = "com.urunc.unikernel.block";
pub const MOUNTPOINT: &str = "com.urunc.unikernel.mountpoint";
pub const MIRAGE_NET_MAP: &str = "urunc.dev/mirage-net-map";
pub const MIRAGE_BLOCK_MAP: &str = "urunc.dev/mirage-block-map";
pub const VACCEL: &str = "com.urunc.unikernel.vAccel";
pub const VACCEL_RPC_ADDRESS: &str = "com.urunc.unikernel.RPCAddress";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_non_empty_and_distinct() {
        let keys = [
            UNIKERNEL_TYPE,
            HYPERVISOR,
            UNIKERNEL_BINARY,
            INITRD,
            CMDLINE,
            BLOCK,
            MOUNTPOINT,
            MIRAGE_NET_MAP,
            MIRAGE_BLOCK_MAP,
            VACCEL,
            VACCEL_RPC_ADDRESS,
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert!(keys.iter().all(|k| !k.is_empty()));
    }
}
