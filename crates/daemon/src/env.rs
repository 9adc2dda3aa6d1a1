// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables understood by the daemon.

use std::path::PathBuf;
use std::time::Duration;

/// Override the state root directory.
pub const ENV_ROOT: &str = "MULTICLAUDE_ROOT";
/// Override assistant-provider selection at runtime.
pub const ENV_PROVIDER: &str = "MULTICLAUDE_PROVIDER";
/// Skip assistant-process interaction in tests.
pub const ENV_TEST_MODE: &str = "MULTICLAUDE_TEST_MODE";
/// Override the periodic-loop interval, in milliseconds.
pub const ENV_TICK_MS: &str = "MULTICLAUDE_TICK_MS";

pub fn state_root() -> Option<PathBuf> {
    std::env::var_os(ENV_ROOT)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn provider() -> Option<String> {
    std::env::var(ENV_PROVIDER).ok().filter(|v| !v.is_empty())
}

pub fn test_mode() -> bool {
    match std::env::var(ENV_TEST_MODE) {
        Ok(v) => !matches!(v.as_str(), "" | "0" | "false"),
        Err(_) => false,
    }
}

pub fn tick_interval() -> Option<Duration> {
    std::env::var(ENV_TICK_MS)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
