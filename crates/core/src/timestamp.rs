// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Fixed schema of phase-transition timestamps captured across `create`,
//! `start`, and the reexec child.
//!
//! Naming convention: `CR.*` = create phase, `ST.*` = start phase,
//! `RX.*` = reexec phase. `LegacyID` (`TS%02d`) is preserved for backward
//! compatibility with existing tooling; `Order` determines the execution
//! sequence and must remain stable.

/// A stable index into [`TIMESTAMPS`].
pub type TimestampId = usize;

/// Number of defined timestamps.
pub const TIMESTAMP_COUNT: usize = 19;

/// Metadata for one well-known phase marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampMeta {
    pub id: TimestampId,
    pub legacy_id: &'static str,
    pub name: &'static str,
    pub order: usize,
}

/// The fixed, stable ordering of all runtime timestamps. `order == index`
/// and `legacy_id` uniquely derives from the index (`TS%02d`); both
/// invariants are checked by [`tests::schema_is_internally_consistent`].
pub const TIMESTAMPS: [TimestampMeta; TIMESTAMP_COUNT] = [
    TimestampMeta { id: 0, legacy_id: "TS00", name: "CR.invoked", order: 0 },
    TimestampMeta { id: 1, legacy_id: "TS01", name: "CR.unikontainer_created", order: 1 },
    TimestampMeta { id: 2, legacy_id: "TS02", name: "CR.initial_setup", order: 2 },
    TimestampMeta { id: 3, legacy_id: "TS03", name: "CR.start_reexec", order: 3 },
    TimestampMeta { id: 4, legacy_id: "TS04", name: "RX.create_invoked", order: 4 },
    TimestampMeta { id: 5, legacy_id: "TS05", name: "RX.close_pipes_and_setup_base", order: 5 },
    TimestampMeta { id: 6, legacy_id: "TS06", name: "CR.received_pids", order: 6 },
    TimestampMeta { id: 7, legacy_id: "TS07", name: "CR.hooks_executed", order: 7 },
    TimestampMeta { id: 8, legacy_id: "TS08", name: "CR.sent_ack", order: 8 },
    TimestampMeta { id: 9, legacy_id: "TS09", name: "RX.received_ack", order: 9 },
    TimestampMeta { id: 10, legacy_id: "TS10", name: "CR.terminated", order: 10 },
    TimestampMeta { id: 11, legacy_id: "TS11", name: "ST.invoked", order: 11 },
    TimestampMeta { id: 12, legacy_id: "TS12", name: "ST.unikontainer_created", order: 12 },
    TimestampMeta { id: 13, legacy_id: "TS13", name: "ST.sent_start_msg", order: 13 },
    TimestampMeta { id: 14, legacy_id: "TS14", name: "RX.received_start_msg", order: 14 },
    TimestampMeta { id: 15, legacy_id: "TS15", name: "RX.joined_netns", order: 15 },
    TimestampMeta { id: 16, legacy_id: "TS16", name: "RX.network_setup_completed", order: 16 },
    TimestampMeta { id: 17, legacy_id: "TS17", name: "RX.disk_setup_completed", order: 17 },
    TimestampMeta { id: 18, legacy_id: "TS18", name: "RX.execve_hypervisor", order: 18 },
];

/// Capability shared by the enabled (file-backed) and disabled (no-op)
/// ledger implementations in `uruncio-ledger`.
///
/// Mirrors the Go original's `metrics.Writer` interface: a single
/// `capture` call per phase transition, with the container ID set once
/// up front so every subsequent capture can stamp it.
pub trait MetricsWriter {
    fn set_container_id(&mut self, container_id: &str);
    fn capture(&self, id: TimestampId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_internally_consistent() {
        let mut seen_legacy = std::collections::HashSet::new();
        for (index, meta) in TIMESTAMPS.iter().enumerate() {
            assert_eq!(meta.id, index, "id must equal array index");
            assert_eq!(meta.order, index, "order must equal index");
            assert_eq!(meta.legacy_id, format!("TS{:02}", index));
            assert!(seen_legacy.insert(meta.legacy_id), "duplicate legacy id");
        }
    }

    #[test]
    fn create_phase_precedes_start_phase() {
        let cr_invoked = TIMESTAMPS[0];
        let st_invoked = TIMESTAMPS[11];
        assert!(cr_invoked.order < st_invoked.order);
    }
}
