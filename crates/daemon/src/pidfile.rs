// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock via an advisory pid file.
//!
//! The file holds one decimal process id. Claiming probes a recorded pid
//! with the null signal: a live process (including one owned by another
//! user, which probes as `EPERM`) keeps the lock; a dead one is stale and
//! is reclaimed. The final write uses `create_new` so two daemons racing
//! for the same stale file cannot both win.

use mc_adapters::pid_alive;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from pid file operations.
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("daemon already running (pid {pid})")]
    AlreadyRunning { pid: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive ownership of the daemon role on this host.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Claim the pid file, recovering a stale entry.
    pub fn claim(path: impl Into<PathBuf>) -> Result<Self, PidFileError> {
        let path = path.into();

        match fs::read_to_string(&path) {
            Ok(content) => {
                // Unparseable content is treated like a stale entry.
                if let Ok(pid) = content.trim().parse::<i32>() {
                    if pid != own_pid() && pid_alive(pid) {
                        return Err(PidFileError::AlreadyRunning { pid });
                    }
                }
                tracing::info!(path = %path.display(), "removing stale pid file");
                remove_tolerant(&path)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", own_pid())?;
                file.sync_all()?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Lost the race to another claimant.
                let pid = fs::read_to_string(&path)
                    .ok()
                    .and_then(|c| c.trim().parse().ok())
                    .unwrap_or(0);
                Err(PidFileError::AlreadyRunning { pid })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the lock. Tolerates an already-absent file.
    pub fn release(&self) -> Result<(), PidFileError> {
        remove_tolerant(&self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn own_pid() -> i32 {
    std::process::id() as i32
}

fn remove_tolerant(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
