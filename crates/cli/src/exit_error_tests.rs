// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

use super::*;

#[test]
fn carries_its_code_through_an_anyhow_chain() {
    let err = ExitError::new(2, "exec is not implemented by this runtime");
    assert_eq!(err.downcast_ref::<ExitError>().unwrap().code, 2);
}

#[test]
fn display_shows_the_message_only() {
    let err = ExitError::new(1, "bundle not found");
    assert_eq!(err.to_string(), "bundle not found");
}

#[test]
fn wrapped_by_context_still_downcasts() {
    let err = ExitError::new(2, "unsupported").context("running exec");
    let exit = err.downcast_ref::<ExitError>().expect("downcast");
    assert_eq!(exit.code, 2);
}
