// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State repair: reconcile obvious drift between the store and reality.
//!
//! Liveness is observed asynchronously by the caller (the listener queries
//! the terminal adapter and the filesystem), then applied here in one
//! exclusive pass. Two passes with the same observations are a no-op.

use crate::state::{StateError, StateStore};
use serde::Serialize;
use std::collections::HashSet;

/// What the caller observed about the outside world.
#[derive(Debug, Default, Clone)]
pub struct RepairObservations {
    /// Repositories whose recorded tmux session is known-absent.
    pub absent_sessions: HashSet<String>,
    /// `(repo, agent)` pairs whose tmux window is known-absent.
    pub absent_windows: HashSet<(String, String)>,
    /// `(repo, agent)` pairs whose worktree directory is missing on disk.
    pub missing_worktrees: HashSet<(String, String)>,
}

/// What repair changed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Repositories dropped because their session was absent.
    pub repos_dropped: Vec<String>,
    /// Agents dropped because their window was absent.
    pub agents_dropped: Vec<String>,
    /// Agents whose ready-for-cleanup flag was cleared because their
    /// worktree no longer exists.
    pub flags_reset: Vec<String>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.repos_dropped.is_empty()
            && self.agents_dropped.is_empty()
            && self.flags_reset.is_empty()
    }
}

impl StateStore {
    /// Apply repair observations, returning what changed.
    pub fn apply_repair(&self, obs: &RepairObservations) -> Result<RepairReport, StateError> {
        self.mutate_for_repair(|state| {
            let mut report = RepairReport::default();

            state.repos.retain(|name, _| {
                let drop = obs.absent_sessions.contains(name);
                if drop {
                    report.repos_dropped.push(name.clone());
                }
                !drop
            });

            for (repo_name, repo) in &mut state.repos {
                repo.agents.retain(|agent_name, _| {
                    let key = (repo_name.clone(), agent_name.clone());
                    let drop = obs.absent_windows.contains(&key);
                    if drop {
                        report.agents_dropped.push(scoped(repo_name, agent_name));
                    }
                    !drop
                });

                for (agent_name, agent) in &mut repo.agents {
                    let key = (repo_name.clone(), agent_name.clone());
                    if agent.ready_for_cleanup && obs.missing_worktrees.contains(&key) {
                        agent.ready_for_cleanup = false;
                        report.flags_reset.push(scoped(repo_name, agent_name));
                    }
                }
            }

            if state
                .current_repo
                .as_deref()
                .is_some_and(|name| !state.repos.contains_key(name))
            {
                state.current_repo = None;
            }

            report.repos_dropped.sort();
            report.agents_dropped.sort();
            report.flags_reset.sort();
            report
        })
    }
}

fn scoped(repo: &str, agent: &str) -> String {
    format!("{repo}/{agent}")
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
