// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Runtime configuration, grounded on
//! `original_source/pkg/unikontainers/urunc_config_test.go`'s flat
//! `urunc_config.*` key map.
//!
//! The shape is expressed as nested TOML tables on disk; `from_map` and
//! `to_map` additionally support the flattened `urunc_config.a.b.c`
//! style used when configuration arrives as OCI annotations rather than
//! a file. Malformed or unknown keys are silently ignored, matching the
//! original's forgiving merge behaviour.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypervisorConfig {
    pub default_memory_mb: u32,
    pub default_vcpus: u32,
    pub binary_path: String,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            default_memory_mb: 256,
            default_vcpus: 1,
            binary_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraBinConfig {
    pub path: String,
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub syslog: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            syslog: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampsConfig {
    pub enabled: bool,
    pub destination: String,
}

impl Default for TimestampsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: "/var/log/urunc/timestamps.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UruncConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub timestamps: TimestampsConfig,
    #[serde(default)]
    pub hypervisors: BTreeMap<String, HypervisorConfig>,
    #[serde(default)]
    pub extra_bins: BTreeMap<String, ExtraBinConfig>,
}

const DEFAULT_HYPERVISORS: [&str; 4] = ["qemu", "hvt", "spt", "firecracker"];

fn default_hypervisors_config() -> BTreeMap<String, HypervisorConfig> {
    DEFAULT_HYPERVISORS
        .iter()
        .map(|name| (name.to_string(), HypervisorConfig::default()))
        .collect()
}

fn default_extra_bin_config() -> BTreeMap<String, ExtraBinConfig> {
    let mut bins = BTreeMap::new();
    bins.insert(
        "virtiofsd".to_string(),
        ExtraBinConfig {
            path: "/usr/libexec/virtiofsd".to_string(),
            options: "--cache always --sandbox none".to_string(),
        },
    );
    bins
}

impl UruncConfig {
    /// The configuration used when no file or annotation overrides any
    /// field.
    pub fn defaults() -> Self {
        Self {
            log: LogConfig::default(),
            timestamps: TimestampsConfig::default(),
            hypervisors: default_hypervisors_config(),
            extra_bins: default_extra_bin_config(),
        }
    }

    pub fn load_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let value: toml::Value = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        let mut flat = BTreeMap::new();
        flatten_toml(&value, "urunc_config", &mut flat);
        Ok(Self::from_map(&flat))
    }

    /// Merges `map`'s flattened `urunc_config.*` keys onto the defaults.
    /// Keys with the wrong shape, an unknown field name, or a value
    /// that fails to parse for its field type are ignored; the
    /// corresponding field keeps its prior (default or already-merged)
    /// value.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut config = Self::defaults();
        for (key, value) in map {
            let parts: Vec<&str> = key.split('.').collect();
            if parts.first() != Some(&"urunc_config") {
                continue;
            }
            match parts.as_slice() {
                ["urunc_config", "hypervisors", name, field] => {
                    let entry = config
                        .hypervisors
                        .entry((*name).to_string())
                        .or_default();
                    apply_hypervisor_field(entry, field, value);
                }
                ["urunc_config", "extra_binaries", name, field] => {
                    let entry = config.extra_bins.entry((*name).to_string()).or_default();
                    apply_extra_bin_field(entry, field, value);
                }
                ["urunc_config", "log", field] => apply_log_field(&mut config.log, field, value),
                ["urunc_config", "timestamps", field] => {
                    apply_timestamps_field(&mut config.timestamps, field, value)
                }
                _ => {}
            }
        }
        config
    }

    /// Flattens this configuration back to `urunc_config.*` keys, the
    /// inverse of [`Self::from_map`].
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (name, hv) in &self.hypervisors {
            map.insert(
                format!("urunc_config.hypervisors.{name}.default_memory_mb"),
                hv.default_memory_mb.to_string(),
            );
            map.insert(
                format!("urunc_config.hypervisors.{name}.default_vcpus"),
                hv.default_vcpus.to_string(),
            );
            map.insert(
                format!("urunc_config.hypervisors.{name}.binary_path"),
                hv.binary_path.clone(),
            );
        }
        for (name, bin) in &self.extra_bins {
            map.insert(
                format!("urunc_config.extra_binaries.{name}.path"),
                bin.path.clone(),
            );
            map.insert(
                format!("urunc_config.extra_binaries.{name}.options"),
                bin.options.clone(),
            );
        }
        map
    }
}

fn apply_hypervisor_field(entry: &mut HypervisorConfig, field: &str, value: &str) {
    match field {
        "default_memory_mb" => {
            if let Ok(parsed) = value.parse::<u32>() {
                entry.default_memory_mb = parsed;
            }
        }
        "default_vcpus" => {
            if let Ok(parsed) = value.parse::<u32>() {
                entry.default_vcpus = parsed;
            }
        }
        "binary_path" => entry.binary_path = value.to_string(),
        _ => {}
    }
}

fn apply_extra_bin_field(entry: &mut ExtraBinConfig, field: &str, value: &str) {
    match field {
        "path" => entry.path = value.to_string(),
        "options" => entry.options = value.to_string(),
        _ => {}
    }
}

fn apply_log_field(entry: &mut LogConfig, field: &str, value: &str) {
    match field {
        "level" => entry.level = value.to_string(),
        "syslog" => {
            if let Ok(parsed) = value.parse::<bool>() {
                entry.syslog = parsed;
            }
        }
        _ => {}
    }
}

fn apply_timestamps_field(entry: &mut TimestampsConfig, field: &str, value: &str) {
    match field {
        "enabled" => {
            if let Ok(parsed) = value.parse::<bool>() {
                entry.enabled = parsed;
            }
        }
        "destination" => entry.destination = value.to_string(),
        _ => {}
    }
}

fn flatten_toml(value: &toml::Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, inner) in table {
                flatten_toml(inner, &format!("{prefix}.{key}"), out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_returns_default_config() {
        let config = UruncConfig::from_map(&BTreeMap::new());
        assert_eq!(config, UruncConfig::defaults());
    }

    #[test]
    fn single_hypervisor_with_all_fields() {
        let config = UruncConfig::from_map(&map(&[
            ("urunc_config.hypervisors.qemu.default_memory_mb", "512"),
            ("urunc_config.hypervisors.qemu.default_vcpus", "2"),
            ("urunc_config.hypervisors.qemu.binary_path", "/usr/bin/qemu"),
        ]));
        let qemu = &config.hypervisors["qemu"];
        assert_eq!(qemu.default_memory_mb, 512);
        assert_eq!(qemu.default_vcpus, 2);
        assert_eq!(qemu.binary_path, "/usr/bin/qemu");
    }

    #[test]
    fn invalid_or_negative_numeric_values_are_ignored() {
        let config = UruncConfig::from_map(&map(&[
            ("urunc_config.hypervisors.qemu.default_memory_mb", "invalid"),
            ("urunc_config.hypervisors.qemu.default_vcpus", "-5"),
            ("urunc_config.hypervisors.qemu.binary_path", "/usr/bin/qemu"),
            ("urunc_config.hypervisors.qemu.field.extra.parts", "invalid"),
        ]));
        let qemu = &config.hypervisors["qemu"];
        assert_eq!(qemu.default_memory_mb, 256);
        assert_eq!(qemu.default_vcpus, 1);
        assert_eq!(qemu.binary_path, "/usr/bin/qemu");
    }

    #[test]
    fn unknown_hypervisor_field_is_ignored() {
        let config = UruncConfig::from_map(&map(&[
            ("urunc_config.hypervisors.qemu.unknown_field", "value"),
            ("urunc_config.hypervisors.qemu.default_memory_mb", "512"),
        ]));
        assert_eq!(config.hypervisors["qemu"].default_memory_mb, 512);
    }

    #[test]
    fn new_hypervisor_not_in_default_config_is_added() {
        let config = UruncConfig::from_map(&map(&[
            ("urunc_config.hypervisors.custom.default_memory_mb", "2048"),
            ("urunc_config.hypervisors.custom.default_vcpus", "4"),
            ("urunc_config.hypervisors.custom.binary_path", "/custom/hypervisor"),
        ]));
        let custom = &config.hypervisors["custom"];
        assert_eq!(custom.default_memory_mb, 2048);
        assert_eq!(custom.default_vcpus, 4);
        assert_eq!(custom.binary_path, "/custom/hypervisor");
    }

    #[test]
    fn preserves_default_hypervisors_not_in_map() {
        let config = UruncConfig::from_map(&map(&[(
            "urunc_config.hypervisors.qemu.default_memory_mb",
            "512",
        )]));
        assert!(config.hypervisors.contains_key("hvt"));
        assert!(config.hypervisors.contains_key("spt"));
        assert!(config.hypervisors.contains_key("firecracker"));
        assert_eq!(config.hypervisors["hvt"].default_memory_mb, 256);
    }

    #[test]
    fn malformed_keys_are_ignored() {
        let config = UruncConfig::from_map(&map(&[
            ("invalid.key.format", "ignored"),
            ("urunc_config.hypervisors", "malformed"),
            ("urunc_config.hypervisors.qemu.default_memory_mb", "512"),
        ]));
        assert_eq!(config.hypervisors["qemu"].default_memory_mb, 512);
    }

    #[test]
    fn single_extra_binary_round_trips() {
        let config = UruncConfig::from_map(&map(&[
            ("urunc_config.extra_binaries.virtiofsd.path", "/usr/bin/qemu"),
            ("urunc_config.extra_binaries.virtiofsd.options", "opt1 opt2"),
        ]));
        let vfs = &config.extra_bins["virtiofsd"];
        assert_eq!(vfs.path, "/usr/bin/qemu");
        assert_eq!(vfs.options, "opt1 opt2");
    }

    #[test]
    fn to_map_round_trips_through_from_map() {
        let original = UruncConfig::defaults();
        let map = original.to_map();
        let rebuilt = UruncConfig::from_map(&map);
        assert_eq!(original, rebuilt);
    }

    #[test]
    fn loads_partial_toml_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urunc.toml");
        std::fs::write(
            &path,
            r#"
            [hypervisors.qemu]
            default_memory_mb = 512
            "#,
        )
        .unwrap();
        let config = UruncConfig::load_toml_file(&path).unwrap();
        assert_eq!(config.hypervisors["qemu"].default_memory_mb, 512);
        assert_eq!(config.hypervisors["hvt"].default_memory_mb, 256);
    }
}
