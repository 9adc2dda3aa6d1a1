// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent records and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Role an agent plays within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "supervisor")]
    Supervisor,
    #[serde(rename = "worker")]
    Worker,
    #[serde(rename = "merge-queue")]
    MergeQueue,
    #[serde(rename = "workspace")]
    Workspace,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "pr-shepherd")]
    PrShepherd,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Supervisor => "supervisor",
            AgentRole::Worker => "worker",
            AgentRole::MergeQueue => "merge-queue",
            AgentRole::Workspace => "workspace",
            AgentRole::Review => "review",
            AgentRole::PrShepherd => "pr-shepherd",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from parsing an agent role string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown agent role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for AgentRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(AgentRole::Supervisor),
            "worker" => Ok(AgentRole::Worker),
            "merge-queue" => Ok(AgentRole::MergeQueue),
            "workspace" => Ok(AgentRole::Workspace),
            "review" => Ok(AgentRole::Review),
            "pr-shepherd" => Ok(AgentRole::PrShepherd),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Record of one agent process owned by the daemon.
///
/// The agent's name is the key under which the record is stored in its
/// repository; the record itself does not repeat it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Role, serialized as `type` for schema compatibility.
    #[serde(rename = "type")]
    pub role: AgentRole,
    /// Absolute path of the agent's checkout. Either the repository main
    /// checkout or a directory strictly inside the repo's worktrees dir.
    pub worktree_path: PathBuf,
    /// Window name inside the repository's tmux session.
    pub tmux_window: String,
    /// Opaque correlation id for the assistant session.
    #[serde(default)]
    pub session_id: String,
    /// OS process id of the assistant process; 0 when unknown.
    #[serde(default)]
    pub pid: i32,
    /// Free-form task description (workers only).
    #[serde(default)]
    pub task: String,
    pub created_at: DateTime<Utc>,
    pub last_nudge: DateTime<Utc>,
    #[serde(default)]
    pub ready_for_cleanup: bool,
}

impl AgentRecord {
    pub fn new(role: AgentRole, worktree_path: impl Into<PathBuf>, tmux_window: &str) -> Self {
        let now = Utc::now();
        Self {
            role,
            worktree_path: worktree_path.into(),
            tmux_window: tmux_window.to_string(),
            session_id: String::new(),
            pid: 0,
            task: String::new(),
            created_at: now,
            last_nudge: now,
            ready_for_cleanup: false,
        }
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_task(mut self, task: &str) -> Self {
        self.task = task.to_string();
        self
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
