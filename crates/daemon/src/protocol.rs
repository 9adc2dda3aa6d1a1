// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Each request is one JSON document tagged with a lowercase `command`;
//! each response is `{"success":true,"data":…}` or
//! `{"success":false,"error":…}`. Wire framing lives in
//! [`crate::protocol_wire`].

use mc_core::{AgentRecord, TrackMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Request from the front-end to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Liveness check.
    Ping,

    /// Aggregate daemon status.
    Status,

    /// Graceful shutdown. The daemon replies before tearing down.
    Stop,

    /// Repository names.
    ListRepos,

    /// Register a repository.
    AddRepo {
        name: String,
        url: String,
        session: String,
        #[serde(default)]
        mq_enabled: bool,
        #[serde(default)]
        mq_track_mode: Option<TrackMode>,
        /// Assistant provider tag; falls back to `MULTICLAUDE_PROVIDER`.
        #[serde(default)]
        provider: Option<String>,
    },

    /// Register an agent within a repository.
    AddAgent {
        repo: String,
        agent: String,
        role: String,
        worktree_path: PathBuf,
        window: String,
        session_id: String,
        #[serde(default)]
        pid: Option<i32>,
        #[serde(default)]
        task: Option<String>,
    },

    /// Mark an agent for asynchronous resource cleanup.
    RemoveAgent { repo: String, agent: String },

    /// Agent records of a repository.
    ListAgents { repo: String },

    /// Mark an agent done and notify the repository's supervisor.
    CompleteAgent { repo: String, agent: String },

    /// Read a repository's merge-queue configuration.
    GetRepoConfig { name: String },

    /// Update a repository's merge-queue configuration.
    UpdateRepoConfig {
        name: String,
        mq_enabled: bool,
        mq_track_mode: TrackMode,
    },

    /// Set the daemon-wide default repository.
    SetCurrentRepo { name: String },

    /// Read the daemon-wide default repository.
    GetCurrentRepo,

    /// Wake the health monitor.
    TriggerCleanup,

    /// Wake the worktree reconciler.
    TriggerWorktreeRefresh,

    /// Reconcile obvious drift between the store and reality.
    RepairState,
}

/// Response to a single request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Success with a serialized payload.
    pub fn ok<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                success: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::error(format!("failed to serialize response: {e}")),
        }
    }

    /// Success without a payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Payload of a `status` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusInfo {
    pub version: String,
    pub uptime_secs: u64,
    pub state_root: PathBuf,
    pub repos: usize,
    pub agents: usize,
    /// Agent counts keyed by role name.
    pub agents_by_role: BTreeMap<String, usize>,
}

/// One agent in a `list_agents` response: the record plus its name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    pub name: String,
    #[serde(flatten)]
    pub record: AgentRecord,
}

/// Payload of a `get_repo_config` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoConfigInfo {
    pub name: String,
    pub enabled: bool,
    pub track_mode: TrackMode,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
