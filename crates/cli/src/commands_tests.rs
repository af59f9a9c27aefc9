// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

use super::*;

#[test]
fn parses_numeric_signals() {
    assert_eq!(parse_signal("9").unwrap(), Signal::SIGKILL);
    assert_eq!(parse_signal("15").unwrap(), Signal::SIGTERM);
}

#[test]
fn parses_named_signals_with_or_without_sig_prefix() {
    assert_eq!(parse_signal("SIGKILL").unwrap(), Signal::SIGKILL);
    assert_eq!(parse_signal("KILL").unwrap(), Signal::SIGKILL);
    assert_eq!(parse_signal("term").unwrap(), Signal::SIGTERM);
}

#[test]
fn rejects_unknown_signals() {
    assert!(parse_signal("NOTASIGNAL").is_err());
    assert!(parse_signal("999").is_err());
}

#[test]
fn ledger_for_returns_null_ledger_when_timestamps_disabled() {
    let mut config = UruncConfig::defaults();
    config.timestamps.enabled = false;
    let mut ledger = ledger_for(&config).unwrap();
    // A disabled ledger must tolerate capture calls as a no-op.
    ledger.capture(0);
}
