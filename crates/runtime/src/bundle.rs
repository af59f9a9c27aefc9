// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The subset of an OCI bundle's `config.json` this runtime reads:
//! annotations, the process environment, the namespace paths the
//! reexec child joins, and the bind mounts the rootfs preparer ingests.
//! Everything else in a real OCI spec (capabilities, cgroup resource
//! limits, seccomp profiles) is the container engine's concern, not a
//! unikernel monitor's, and is intentionally not modeled.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uruncio_hooks::HookSpec;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read bundle spec {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bundle spec {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSpec {
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    #[serde(default)]
    process: RawProcess,
    #[serde(default)]
    linux: RawLinux,
    #[serde(default)]
    hooks: RawHooks,
    #[serde(default)]
    mounts: Vec<RawMount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawProcess {
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawLinux {
    #[serde(default)]
    namespaces: Vec<RawNamespace>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawNamespace {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawHooks {
    #[serde(default)]
    prestart: Vec<RawHook>,
    #[serde(default)]
    poststart: Vec<RawHook>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawHook {
    path: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawMount {
    destination: String,
    #[serde(default)]
    source: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// One entry from the bundle's `mounts` array. Only `kind == "bind"`
/// entries are promoted or copied by the rootfs preparer; the rest
/// (`proc`, `sysfs`, `tmpfs`, ...) are the container engine's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: String,
}

impl Mount {
    pub fn is_bind(&self) -> bool {
        self.kind == "bind"
    }
}

fn into_hook_spec(raw: RawHook) -> HookSpec {
    HookSpec {
        path: PathBuf::from(raw.path),
        args: raw.args,
        env: raw.env,
        timeout: raw.timeout.map(Duration::from_secs),
    }
}

/// A parsed bundle: the directory it lives in, plus the fields this
/// runtime actually consumes.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub path: PathBuf,
    pub annotations: BTreeMap<String, String>,
    pub env: Vec<String>,
    pub args: Vec<String>,
    pub namespace_paths: BTreeMap<String, PathBuf>,
    pub mounts: Vec<Mount>,
    pub prestart_hooks: Vec<HookSpec>,
    pub poststart_hooks: Vec<HookSpec>,
    /// The bundle's `config.json`, verbatim, for `StateRecord`'s inline
    /// container spec field.
    pub raw_spec: serde_json::Value,
}

impl Bundle {
    pub fn load(bundle_dir: &Path) -> Result<Self, BundleError> {
        let config_path = bundle_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(|source| BundleError::Read {
            path: config_path.clone(),
            source,
        })?;
        let raw: RawSpec = serde_json::from_str(&contents).map_err(|source| BundleError::Parse {
            path: config_path.clone(),
            source,
        })?;
        let raw_spec: serde_json::Value = serde_json::from_str(&contents).map_err(|source| BundleError::Parse {
            path: config_path.clone(),
            source,
        })?;

        let namespace_paths = raw
            .linux
            .namespaces
            .into_iter()
            .filter(|ns| !ns.path.is_empty())
            .map(|ns| (ns.kind, PathBuf::from(ns.path)))
            .collect();

        let mounts = raw
            .mounts
            .into_iter()
            .map(|m| Mount {
                source: PathBuf::from(m.source),
                destination: PathBuf::from(m.destination),
                kind: m.kind,
            })
            .collect();

        Ok(Self {
            path: bundle_dir.to_path_buf(),
            annotations: raw.annotations,
            env: raw.process.env,
            args: raw.process.args,
            namespace_paths,
            mounts,
            prestart_hooks: raw.hooks.prestart.into_iter().map(into_hook_spec).collect(),
            poststart_hooks: raw.hooks.poststart.into_iter().map(into_hook_spec).collect(),
            raw_spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_annotations_and_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{
                "annotations": {"com.urunc.unikernel.unikernelType": "mirage"},
                "process": {"env": ["FOO=bar"], "args": ["/unikernel.bin"]},
                "linux": {"namespaces": [{"type": "network", "path": "/proc/123/ns/net"}]},
                "hooks": {"prestart": [{"path": "/bin/true", "timeout": 5}]}
            }"#,
        )
        .unwrap();

        let bundle = Bundle::load(dir.path()).unwrap();
        assert_eq!(
            bundle.annotations.get("com.urunc.unikernel.unikernelType").map(String::as_str),
            Some("mirage")
        );
        assert_eq!(bundle.env, vec!["FOO=bar".to_string()]);
        assert_eq!(
            bundle.namespace_paths.get("network"),
            Some(&PathBuf::from("/proc/123/ns/net"))
        );
        assert_eq!(bundle.prestart_hooks.len(), 1);
        assert_eq!(bundle.prestart_hooks[0].timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();
        let bundle = Bundle::load(dir.path()).unwrap();
        assert!(bundle.annotations.is_empty());
        assert!(bundle.namespace_paths.is_empty());
        assert!(bundle.mounts.is_empty());
    }

    #[test]
    fn loads_bind_and_non_bind_mounts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{
                "mounts": [
                    {"destination": "/data/vol0", "source": "/host/vol0", "type": "bind"},
                    {"destination": "/proc", "source": "proc", "type": "proc"}
                ]
            }"#,
        )
        .unwrap();

        let bundle = Bundle::load(dir.path()).unwrap();
        assert_eq!(bundle.mounts.len(), 2);
        assert!(bundle.mounts[0].is_bind());
        assert_eq!(bundle.mounts[0].destination, PathBuf::from("/data/vol0"));
        assert!(!bundle.mounts[1].is_bind());
    }
}
