// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

use super::*;

#[test]
fn debug_flag_raises_the_default_level() {
    std::env::remove_var("RUST_LOG");
    assert_eq!(filter(false).to_string(), "info");
    assert_eq!(filter(true).to_string(), "debug");
}

#[test]
fn log_format_values_are_distinct() {
    assert_ne!(LogFormat::Text, LogFormat::Json);
}
