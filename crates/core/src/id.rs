// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Container identifier.

use std::fmt;
use thiserror::Error;

/// A non-empty, opaque container identifier.
///
/// Unique across the host; it is the key for every on-disk artifact
/// (`state.json`, the per-container socket directory) and for the two
/// IPC socket names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

/// Error returned when a string cannot be used as a [`ContainerId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerIdError {
    #[error("container id must not be empty")]
    Empty,
}

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContainerIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ContainerIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_id() {
        assert_eq!(ContainerId::new(""), Err(ContainerIdError::Empty));
    }

    #[test]
    fn accepts_opaque_string() {
        let id = ContainerId::new("my-container-1").unwrap();
        assert_eq!(id.as_str(), "my-container-1");
        assert_eq!(id.to_string(), "my-container-1");
    }
}
