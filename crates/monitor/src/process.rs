// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Monitor process teardown, grounded on
//! `original_source/pkg/unikontainers/hypervisors/utils.go`'s
//! `killProcess`: send `SIGKILL`, then poll the pid with a zero signal
//! until the kernel reports `ESRCH`, or give up after a deadline.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::thread::sleep;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: i32, source: Errno },
    #[error("pid {pid} did not exit within the timeout")]
    Timeout { pid: i32 },
}

/// Sends `SIGKILL` to `pid` and waits for it to disappear, up to
/// `timeout` (defaulting to two seconds when `None`).
pub fn kill_and_wait(pid: i32, timeout: Option<Duration>) -> Result<(), ProcessError> {
    let target = Pid::from_raw(pid);
    match kill(target, Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(()),
        Err(source) => return Err(ProcessError::Signal { pid, source }),
    }

    let deadline = Instant::now() + timeout.unwrap_or(DEFAULT_TIMEOUT);
    loop {
        match kill(target, None) {
            Err(Errno::ESRCH) => return Ok(()),
            Ok(()) | Err(_) => {}
        }
        if Instant::now() >= deadline {
            return Err(ProcessError::Timeout { pid });
        }
        sleep(POLL_INTERVAL);
    }
}

/// Returns `true` if `pid` still refers to a live process.
pub fn is_alive(pid: i32) -> bool {
    !matches!(kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
}
