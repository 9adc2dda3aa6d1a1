// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level request handlers: status and state repair.

use std::collections::BTreeMap;

use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_storage::RepairObservations;
use tracing::warn;

use crate::lifecycle::DaemonCtx;
use crate::protocol::{Response, StatusInfo};
use crate::protocol_wire::PROTOCOL_VERSION;

pub(crate) fn handle_status<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
) -> Response {
    let state = ctx.store.snapshot();

    let mut agents = 0;
    let mut agents_by_role: BTreeMap<String, usize> = BTreeMap::new();
    for repo in state.repos.values() {
        for record in repo.agents.values() {
            agents += 1;
            *agents_by_role.entry(record.role.to_string()).or_default() += 1;
        }
    }

    Response::ok(StatusInfo {
        version: PROTOCOL_VERSION.to_string(),
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        state_root: ctx.paths.root().to_path_buf(),
        repos: state.repos.len(),
        agents,
        agents_by_role,
    })
}

/// Observe session/window/worktree liveness, then reconcile the store
/// toward it in one exclusive pass.
pub(crate) async fn handle_repair<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
) -> Response {
    let state = ctx.store.snapshot();
    let mut obs = RepairObservations::default();

    for (repo_name, repo) in &state.repos {
        match ctx.terminal.has_session(&repo.tmux_session).await {
            Ok(false) => {
                obs.absent_sessions.insert(repo_name.clone());
                continue;
            }
            Ok(true) => {}
            Err(e) => {
                // Collaborator unavailable: no observation, no repair.
                warn!(repo = %repo_name, "cannot probe session: {e}");
                continue;
            }
        }

        for (agent_name, agent) in &repo.agents {
            match ctx
                .terminal
                .has_window(&repo.tmux_session, &agent.tmux_window)
                .await
            {
                Ok(false) => {
                    obs.absent_windows
                        .insert((repo_name.clone(), agent_name.clone()));
                }
                Ok(true) => {}
                Err(e) => {
                    warn!(repo = %repo_name, agent = %agent_name, "cannot probe window: {e}");
                }
            }

            let worktree = &agent.worktree_path;
            if !worktree.as_os_str().is_empty() && !worktree.exists() {
                obs.missing_worktrees
                    .insert((repo_name.clone(), agent_name.clone()));
            }
        }
    }

    match ctx.store.apply_repair(&obs) {
        Ok(report) => Response::ok(report),
        Err(e) => Response::error(e.to_string()),
    }
}
