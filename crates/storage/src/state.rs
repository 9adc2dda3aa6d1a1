// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state store: sole authority over repositories and agents.
//!
//! Reads take a shared lock and return deep copies; writes take an
//! exclusive lock and persist before releasing it, so persistence can
//! never interleave with further mutation. The save is atomic: the full
//! state is serialized to `state.json.tmp`, fsync'd, then renamed over
//! `state.json` — a crash leaves either the pre-write or post-write file.

use chrono::{DateTime, Utc};
use mc_core::{AgentRecord, MergeQueueConfig, RepoRecord, State};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file {path} is malformed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("repository not found: {0}")]
    RepoNotFound(String),

    #[error("repository already exists: {0}")]
    RepoExists(String),

    #[error("agent not found: {0}/{1}")]
    AgentNotFound(String, String),

    #[error("agent already exists: {0}/{1}")]
    AgentExists(String, String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Concurrent-safe map of repository name → repository record.
pub struct StateStore {
    path: PathBuf,
    inner: RwLock<State>,
}

impl StateStore {
    /// Load the store from `path`.
    ///
    /// A missing file is an empty state; malformed content is fatal.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let state = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                StateError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            inner: RwLock::new(state),
        })
    }

    /// Deep copy of the entire state.
    pub fn snapshot(&self) -> State {
        self.inner.read().clone()
    }

    /// Persist the current state. Called by every mutator under the write
    /// lock; exposed for the shutdown path's final save.
    pub fn save(&self) -> Result<(), StateError> {
        let state = self.inner.read();
        self.save_locked(&state)
    }

    fn save_locked(&self, state: &State) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = tmp_path(&self.path);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, state)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Run a mutation under the exclusive lock and persist before releasing.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, StateError>,
    ) -> Result<T, StateError> {
        let mut state = self.inner.write();
        let value = f(&mut state)?;
        self.save_locked(&state)?;
        Ok(value)
    }

    // --- repositories ---

    pub fn add_repo(&self, name: &str, record: RepoRecord) -> Result<(), StateError> {
        require_name(name, "repository name")?;
        self.mutate(|state| {
            if state.repos.contains_key(name) {
                return Err(StateError::RepoExists(name.to_string()));
            }
            state.repos.insert(name.to_string(), record);
            Ok(())
        })
    }

    pub fn remove_repo(&self, name: &str) -> Result<RepoRecord, StateError> {
        self.mutate(|state| {
            let record = state
                .repos
                .remove(name)
                .ok_or_else(|| StateError::RepoNotFound(name.to_string()))?;
            if state.current_repo.as_deref() == Some(name) {
                state.current_repo = None;
            }
            Ok(record)
        })
    }

    pub fn get_repo(&self, name: &str) -> Option<RepoRecord> {
        self.inner.read().repos.get(name).cloned()
    }

    /// Repository names, sorted.
    pub fn list_repos(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().repos.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set_merge_queue_config(
        &self,
        repo: &str,
        config: MergeQueueConfig,
    ) -> Result<(), StateError> {
        self.mutate(|state| {
            repo_mut(state, repo)?.merge_queue_config = config;
            Ok(())
        })
    }

    pub fn set_current_repo(&self, name: &str) -> Result<(), StateError> {
        self.mutate(|state| {
            if !state.repos.contains_key(name) {
                return Err(StateError::RepoNotFound(name.to_string()));
            }
            state.current_repo = Some(name.to_string());
            Ok(())
        })
    }

    pub fn current_repo(&self) -> Option<String> {
        self.inner.read().current_repo.clone()
    }

    // --- agents ---

    /// Register an agent. The tmux window name must be unique within the
    /// repository; worktree-path validation against the filesystem layout
    /// is the caller's concern.
    pub fn add_agent(
        &self,
        repo: &str,
        agent: &str,
        record: AgentRecord,
    ) -> Result<(), StateError> {
        require_name(agent, "agent name")?;
        self.mutate(|state| {
            let repo_record = repo_mut(state, repo)?;
            if repo_record.agents.contains_key(agent) {
                return Err(StateError::AgentExists(repo.to_string(), agent.to_string()));
            }
            if repo_record
                .agents
                .values()
                .any(|a| a.tmux_window == record.tmux_window)
            {
                return Err(StateError::InvalidInput(format!(
                    "tmux window {} already in use in repository {}",
                    record.tmux_window, repo
                )));
            }
            repo_record.agents.insert(agent.to_string(), record);
            Ok(())
        })
    }

    pub fn remove_agent(&self, repo: &str, agent: &str) -> Result<AgentRecord, StateError> {
        self.mutate(|state| {
            repo_mut(state, repo)?
                .agents
                .remove(agent)
                .ok_or_else(|| StateError::AgentNotFound(repo.to_string(), agent.to_string()))
        })
    }

    pub fn get_agent(&self, repo: &str, agent: &str) -> Option<AgentRecord> {
        self.inner.read().repos.get(repo)?.agents.get(agent).cloned()
    }

    /// Agents of a repository as `(name, record)` pairs, sorted by name.
    pub fn list_agents(&self, repo: &str) -> Result<Vec<(String, AgentRecord)>, StateError> {
        let state = self.inner.read();
        let repo_record = state
            .repos
            .get(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        let mut agents: Vec<(String, AgentRecord)> = repo_record
            .agents
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();
        agents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(agents)
    }

    pub fn set_agent_pid(&self, repo: &str, agent: &str, pid: i32) -> Result<(), StateError> {
        self.mutate(|state| {
            agent_mut(state, repo, agent)?.pid = pid;
            Ok(())
        })
    }

    pub fn set_agent_session_id(
        &self,
        repo: &str,
        agent: &str,
        session_id: &str,
    ) -> Result<(), StateError> {
        self.mutate(|state| {
            agent_mut(state, repo, agent)?.session_id = session_id.to_string();
            Ok(())
        })
    }

    pub fn set_agent_task(&self, repo: &str, agent: &str, task: &str) -> Result<(), StateError> {
        self.mutate(|state| {
            agent_mut(state, repo, agent)?.task = task.to_string();
            Ok(())
        })
    }

    pub fn set_last_nudge(
        &self,
        repo: &str,
        agent: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        self.mutate(|state| {
            agent_mut(state, repo, agent)?.last_nudge = at;
            Ok(())
        })
    }

    pub fn mark_ready_for_cleanup(&self, repo: &str, agent: &str) -> Result<(), StateError> {
        self.set_ready_for_cleanup(repo, agent, true)
    }

    pub fn set_ready_for_cleanup(
        &self,
        repo: &str,
        agent: &str,
        ready: bool,
    ) -> Result<(), StateError> {
        self.mutate(|state| {
            agent_mut(state, repo, agent)?.ready_for_cleanup = ready;
            Ok(())
        })
    }

    pub(crate) fn mutate_for_repair<T>(
        &self,
        f: impl FnOnce(&mut State) -> T,
    ) -> Result<T, StateError> {
        self.mutate(|state| Ok(f(state)))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

fn require_name(name: &str, what: &str) -> Result<(), StateError> {
    if name.trim().is_empty() {
        return Err(StateError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

fn repo_mut<'a>(state: &'a mut State, repo: &str) -> Result<&'a mut RepoRecord, StateError> {
    state
        .repos
        .get_mut(repo)
        .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))
}

fn agent_mut<'a>(
    state: &'a mut State,
    repo: &str,
    agent: &str,
) -> Result<&'a mut AgentRecord, StateError> {
    repo_mut(state, repo)?
        .agents
        .get_mut(agent)
        .ok_or_else(|| StateError::AgentNotFound(repo.to_string(), agent.to_string()))
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
