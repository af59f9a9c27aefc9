// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Handoff sockets connecting the `create` reexec child to the `start`
//! caller, grounded on `original_source/cmd/urunc/start.go`'s
//! `CreateListener`/`CreateConn`/`SendMessage`/`AwaitMsg` sequence.
//!
//! Two named AF_UNIX datagram sockets live in the container's state
//! directory:
//!
//! * `uruncio.sock` -- bound by the reexec child, used by `start` to
//!   deliver [`HandoffMessage::StartExecve`].
//! * `start.sock` -- bound by `start`, used by the reexec child to
//!   deliver [`HandoffMessage::StartSuccess`] once the monitor is about
//!   to be exec'd.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uruncio_core::handoff::UnknownMessage;
use uruncio_core::HandoffMessage;

pub const REEXEC_SOCKET_NAME: &str = "uruncio.sock";
pub const START_SOCKET_NAME: &str = "start.sock";
/// Internal create-parent/reexec-child acknowledgement channel. Distinct
/// from the two handoff sockets above, which only ever carry
/// [`HandoffMessage::StartExecve`] and [`HandoffMessage::StartSuccess`].
pub const ACK_SOCKET_NAME: &str = "ack.sock";

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("failed to bind handoff socket {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to connect to handoff socket {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to send handoff message: {0}")]
    Send(#[source] std::io::Error),
    #[error("timed out waiting for handoff message after {0:?}")]
    Timeout(Duration),
    #[error("failed to receive handoff message: {0}")]
    Recv(#[source] std::io::Error),
    #[error("received {0}")]
    UnknownByte(#[from] UnknownMessage),
    #[error("expected handoff message {expected:?}, got {actual:?}")]
    Unexpected {
        expected: HandoffMessage,
        actual: HandoffMessage,
    },
}

/// One end of a handoff socket, bound and ready to receive.
pub struct HandoffListener {
    socket: UnixDatagram,
    path: PathBuf,
}

impl HandoffListener {
    /// Binds a fresh datagram socket at `path`, removing any stale
    /// socket file left behind by a prior, crashed run.
    pub fn bind(path: &Path) -> Result<Self, IpcError> {
        let _ = std::fs::remove_file(path);
        let socket = UnixDatagram::bind(path).map_err(|source| IpcError::Bind {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            socket,
            path: path.to_path_buf(),
        })
    }

    /// Blocks until a single-byte handoff message arrives, or `timeout`
    /// elapses.
    pub fn recv(&self, timeout: Duration) -> Result<HandoffMessage, IpcError> {
        self.socket
            .set_read_timeout(Some(timeout))
            .map_err(IpcError::Recv)?;
        let mut buf = [0u8; 1];
        let read = self.socket.recv(&mut buf).map_err(|source| {
            if matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) {
                IpcError::Timeout(timeout)
            } else {
                IpcError::Recv(source)
            }
        })?;
        if read == 0 {
            return Err(IpcError::Recv(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "empty handoff datagram",
            )));
        }
        Ok(HandoffMessage::try_from(buf[0])?)
    }

    /// Blocks until `expected` arrives, rejecting any other message.
    pub fn await_message(
        &self,
        expected: HandoffMessage,
        timeout: Duration,
    ) -> Result<(), IpcError> {
        let actual = self.recv(timeout)?;
        if actual != expected {
            return Err(IpcError::Unexpected { expected, actual });
        }
        Ok(())
    }
}

impl Drop for HandoffListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// The sending half, connected to a peer's already-bound socket.
pub struct HandoffSender {
    socket: UnixDatagram,
}

impl HandoffSender {
    pub fn connect(path: &Path) -> Result<Self, IpcError> {
        let socket = UnixDatagram::unbound().map_err(|source| IpcError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        socket.connect(path).map_err(|source| IpcError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { socket })
    }

    pub fn send(&self, message: HandoffMessage) -> Result<(), IpcError> {
        self.socket
            .send(&[message.as_byte()])
            .map_err(IpcError::Send)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REEXEC_SOCKET_NAME);
        let listener = HandoffListener::bind(&path).unwrap();
        let sender = HandoffSender::connect(&path).unwrap();
        sender.send(HandoffMessage::StartExecve).unwrap();
        let got = listener.recv(Duration::from_secs(1)).unwrap();
        assert_eq!(got, HandoffMessage::StartExecve);
    }

    #[test]
    fn await_message_rejects_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(START_SOCKET_NAME);
        let listener = HandoffListener::bind(&path).unwrap();
        let sender = HandoffSender::connect(&path).unwrap();
        sender.send(HandoffMessage::Ack).unwrap();
        let err = listener
            .await_message(HandoffMessage::StartSuccess, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, IpcError::Unexpected { .. }));
    }

    #[test]
    fn recv_times_out_when_nothing_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idle.sock");
        let listener = HandoffListener::bind(&path).unwrap();
        let err = listener.recv(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, IpcError::Timeout(_)));
    }

    #[test]
    fn bind_removes_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.sock");
        std::fs::write(&path, b"not a socket").unwrap();
        let listener = HandoffListener::bind(&path);
        assert!(listener.is_ok());
    }
}
