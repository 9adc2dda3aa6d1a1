// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness probing.

/// Probe a process with the null signal.
///
/// `EPERM` means the process exists but belongs to another user, which
/// still counts as alive; only `ESRCH` (no such process) is dead.
/// Non-positive pids are never alive.
pub fn pid_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
