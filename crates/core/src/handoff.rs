// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! The fixed handoff message vocabulary exchanged over the two IPC
//! sockets. No payload; the byte value alone conveys phase.

use thiserror::Error;

/// A single-byte message exchanged between the `start` caller and the
/// reexec child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandoffMessage {
    /// Sent on `uruncio.sock` by `start` to release the waiting reexec
    /// child into monitor execution.
    StartExecve = 1,
    /// Reserved for the internal create-parent/reexec-child
    /// prestart-hooks acknowledgement; never sent over either named
    /// socket.
    Ack = 2,
    /// Sent on `start.sock` by the reexec child once it has reached the
    /// point of handing off to the monitor.
    StartSuccess = 3,
}

/// A byte on the wire that doesn't match any known message kind.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown handoff message byte: {0}")]
pub struct UnknownMessage(pub u8);

impl HandoffMessage {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for HandoffMessage {
    type Error = UnknownMessage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HandoffMessage::StartExecve),
            2 => Ok(HandoffMessage::Ack),
            3 => Ok(HandoffMessage::StartSuccess),
            other => Err(UnknownMessage(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_byte() {
        for msg in [
            HandoffMessage::StartExecve,
            HandoffMessage::Ack,
            HandoffMessage::StartSuccess,
        ] {
            assert_eq!(HandoffMessage::try_from(msg.as_byte()), Ok(msg));
        }
    }

    #[test]
    fn rejects_unknown_byte() {
        assert_eq!(HandoffMessage::try_from(0), Err(UnknownMessage(0)));
        assert_eq!(HandoffMessage::try_from(255), Err(UnknownMessage(255)));
    }
}
