// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Composed error type for the `create`/`start`/`run`/`state`/`kill`/
//! `delete` orchestration, wrapping each crate's own error taxonomy via
//! `#[from]`.

use std::path::PathBuf;
use thiserror::Error;
use uruncio_config::ConfigError;
use uruncio_hooks::HookError;
use uruncio_ipc::IpcError;
use uruncio_monitor::{MonitorError, ProcessError};
use uruncio_rootfs::{BlockError, DevNodeError, MountInfoError, MountIngestError};
use uruncio_state::StateError;
use uruncio_unikernel::CommandStringError;
use uruncio_vaccel::VaccelError;

use crate::bundle::BundleError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container {0:?} not found")]
    ContainerNotFound(String),
    #[error("bad state: {0}")]
    BadState(String),
    #[error("unsupported unikernel type {0:?}")]
    UnsupportedUnikernel(String),
    #[error("unsupported hypervisor {0:?}")]
    UnsupportedMonitor(String),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("failed to enter namespace {path}: {source}")]
    JoinNamespace {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("failed to unmount {path}: {source}")]
    Umount {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("failed to bind-mount {source_path} onto {path}: {source}")]
    BindMount {
        path: PathBuf,
        source_path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("failed to signal container state directory {path}: {source}")]
    Signal {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Ipc(#[from] IpcError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    DevNode(#[from] DevNodeError),
    #[error(transparent)]
    MountInfo(#[from] MountInfoError),
    #[error(transparent)]
    MountIngest(#[from] MountIngestError),
    #[error(transparent)]
    CommandString(#[from] CommandStringError),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Vaccel(#[from] VaccelError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
