// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Guest network configuration.

use serde::{Deserialize, Serialize};

/// Network parameters for the guest's single network interface.
///
/// An empty `mask` signals "no networking" throughout the unikernel and
/// monitor adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub mask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub tap_device: String,
}

impl NetworkParams {
    /// Whether networking was requested at all.
    pub fn is_enabled(&self) -> bool {
        !self.mask.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_means_disabled() {
        let params = NetworkParams::default();
        assert!(!params.is_enabled());
    }

    #[test]
    fn non_empty_mask_means_enabled() {
        let params = NetworkParams {
            mask: "255.255.255.0".into(),
            ..Default::default()
        };
        assert!(params.is_enabled());
    }
}
