// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! OCI lifecycle hook execution: `Prestart` runs before the guest
//! artifacts are handed to the monitor and aborts `create` on failure;
//! `Poststart` runs after `start` has confirmed the handoff and only
//! logs on failure. Timeout-and-kill polling uses a synchronous
//! `try_wait` loop so this crate does not need an async runtime.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Prestart,
    Poststart,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Prestart => "Prestart",
            HookKind::Poststart => "Poststart",
        }
    }
}

/// One hook to run, as declared in the bundle's `config.json`.
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to spawn hook {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("hook {path} timed out after {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },
    #[error("hook {path} exited with status {status}")]
    NonZeroExit { path: PathBuf, status: i32 },
    #[error("hook {path} was terminated by a signal")]
    Signaled { path: PathBuf },
    #[error("failed while waiting on hook {path}: {source}")]
    Wait {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one hook to completion, enforcing `spec.timeout` by polling
/// `try_wait` and killing the child if it overruns.
pub fn run_hook(spec: &HookSpec) -> Result<(), HookError> {
    let mut command = Command::new(&spec.path);
    command.args(&spec.args);
    command.env_clear();
    for entry in &spec.env {
        if let Some((key, value)) = entry.split_once('=') {
            command.env(key, value);
        }
    }

    let mut child = command.spawn().map_err(|source| HookError::Spawn {
        path: spec.path.clone(),
        source,
    })?;

    let deadline = spec.timeout.map(|timeout| (Instant::now() + timeout, timeout));

    loop {
        match child.try_wait().map_err(|source| HookError::Wait {
            path: spec.path.clone(),
            source,
        })? {
            Some(status) => {
                return match status.code() {
                    Some(0) => Ok(()),
                    Some(code) => Err(HookError::NonZeroExit {
                        path: spec.path.clone(),
                        status: code,
                    }),
                    None => Err(HookError::Signaled {
                        path: spec.path.clone(),
                    }),
                };
            }
            None => {
                if let Some((deadline_at, timeout)) = deadline {
                    if Instant::now() >= deadline_at {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(HookError::Timeout {
                            path: spec.path.clone(),
                            timeout,
                        });
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/// Runs every hook of `kind` in order. A `Prestart` failure stops at the
/// first error and is propagated to abort `create`. A `Poststart`
/// failure is logged and the remaining hooks still run, since the
/// container is already handed off to the monitor by that point.
pub fn run_hooks(kind: HookKind, hooks: &[HookSpec]) -> Result<(), HookError> {
    for hook in hooks {
        match run_hook(hook) {
            Ok(()) => {}
            Err(err) if kind == HookKind::Prestart => return Err(err),
            Err(err) => {
                tracing::error!(hook = %hook.path.display(), kind = kind.as_str(), error = %err, "lifecycle hook failed");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(script: &str, timeout: Option<Duration>) -> HookSpec {
        HookSpec {
            path: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            env: vec![],
            timeout,
        }
    }

    #[test]
    fn successful_hook_returns_ok() {
        run_hook(&spec("exit 0", None)).unwrap();
    }

    #[test]
    fn nonzero_exit_is_reported() {
        let err = run_hook(&spec("exit 7", None)).unwrap_err();
        assert!(matches!(err, HookError::NonZeroExit { status: 7, .. }));
    }

    #[test]
    fn overrunning_hook_is_killed_on_timeout() {
        let err = run_hook(&spec("sleep 5", Some(Duration::from_millis(100)))).unwrap_err();
        assert!(matches!(err, HookError::Timeout { .. }));
    }

    #[test]
    fn prestart_failure_aborts_remaining_hooks() {
        let hooks = vec![spec("exit 1", None), spec("exit 0", None)];
        let err = run_hooks(HookKind::Prestart, &hooks).unwrap_err();
        assert!(matches!(err, HookError::NonZeroExit { status: 1, .. }));
    }

    #[test]
    fn poststart_failure_does_not_abort() {
        let hooks = vec![spec("exit 1", None), spec("exit 0", None)];
        run_hooks(HookKind::Poststart, &hooks).unwrap();
    }
}
