// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn own_process_is_alive() {
    let pid = std::process::id() as i32;
    assert!(pid_alive(pid));
}

#[test]
fn absent_pid_is_dead() {
    // Pid max on Linux defaults to 4194304; this one cannot exist.
    assert!(!pid_alive(999_999_999));
}

#[test]
fn non_positive_pids_are_never_alive() {
    assert!(!pid_alive(0));
    assert!(!pid_alive(-1));
}

#[test]
fn init_process_is_alive_despite_eperm() {
    // Signaling pid 1 as an unprivileged user yields EPERM, which must
    // still read as alive.
    assert!(pid_alive(1));
}
