// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository records and merge-queue configuration.

use crate::agent::AgentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which pull requests the merge-queue agent tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    /// Every open pull request.
    #[default]
    All,
    /// Only pull requests authored by the configured user.
    Author,
    /// Only pull requests assigned to the configured user.
    Assigned,
}

impl std::fmt::Display for TrackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackMode::All => write!(f, "all"),
            TrackMode::Author => write!(f, "author"),
            TrackMode::Assigned => write!(f, "assigned"),
        }
    }
}

impl std::str::FromStr for TrackMode {
    type Err = crate::agent::ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TrackMode::All),
            "author" => Ok(TrackMode::Author),
            "assigned" => Ok(TrackMode::Assigned),
            other => Err(crate::agent::ParseRoleError(other.to_string())),
        }
    }
}

/// Merge-queue configuration for a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeQueueConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub track_mode: TrackMode,
}

/// Record of one tracked repository and its agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Upstream clone URL.
    pub github_url: String,
    /// Name of the tmux session hosting this repository's agents.
    pub tmux_session: String,
    #[serde(default)]
    pub merge_queue_config: MergeQueueConfig,
    /// Assistant provider tag, when pinned for this repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Agents keyed by agent name.
    #[serde(default)]
    pub agents: HashMap<String, AgentRecord>,
}

impl RepoRecord {
    pub fn new(github_url: &str, tmux_session: &str) -> Self {
        Self {
            github_url: github_url.to_string(),
            tmux_session: tmux_session.to_string(),
            merge_queue_config: MergeQueueConfig::default(),
            provider: None,
            agents: HashMap::new(),
        }
    }

    /// Name of the supervisor agent, if one is registered.
    pub fn supervisor(&self) -> Option<&str> {
        self.agents
            .iter()
            .find(|(_, record)| record.role == crate::agent::AgentRole::Supervisor)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
