// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path derivation for everything the daemon owns on disk.
//!
//! All paths hang off a single root directory:
//!
//! ```text
//! <root>/
//!   daemon.pid                 single-line decimal process id
//!   daemon.sock                unix socket
//!   daemon.log                 append-only log
//!   state.json                 persisted daemon state
//!   repos/<repo>/              repository main checkouts
//!   wts/<repo>/<agent>/        per-agent worktrees
//!   messages/<repo>/<agent>/   message files, one per message
//!   output/<repo>/<agent>.log  per-agent transcripts
//!   prompts/<agent>.md         assembled agent prompts
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Derives every daemon-owned path from a single root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn daemon_pid(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }

    pub fn daemon_socket(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn daemon_log(&self) -> PathBuf {
        self.root.join("daemon.log")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join("wts")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.root.join("messages")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    /// Main checkout of a repository.
    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.repos_dir().join(repo)
    }

    /// Directory holding all worktrees of a repository.
    pub fn worktree_dir(&self, repo: &str) -> PathBuf {
        self.worktrees_dir().join(repo)
    }

    /// Worktree of a single agent.
    pub fn agent_worktree(&self, repo: &str, agent: &str) -> PathBuf {
        self.worktree_dir(repo).join(agent)
    }

    /// Message directory of a single recipient agent.
    pub fn message_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.messages_dir().join(repo).join(agent)
    }

    /// Transcript log of a single agent.
    pub fn agent_log(&self, repo: &str, agent: &str) -> PathBuf {
        self.output_dir().join(repo).join(format!("{agent}.log"))
    }

    /// Assembled prompt for an agent.
    pub fn prompt_file(&self, agent: &str) -> PathBuf {
        self.prompts_dir().join(format!("{agent}.md"))
    }

    /// Create all fixed directories. Idempotent.
    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.repos_dir(),
            self.worktrees_dir(),
            self.messages_dir(),
            self.output_dir(),
            self.prompts_dir(),
        ] {
            create_dir_0755(&dir)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_dir_0755(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true).mode(0o755);
    builder.create(dir)
}

#[cfg(not(unix))]
fn create_dir_0755(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
