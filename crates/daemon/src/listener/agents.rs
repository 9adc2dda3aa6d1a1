// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent request handlers.

use std::path::{Path, PathBuf};

use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_core::{AgentRecord, AgentRole};
use tracing::{info, warn};

use crate::lifecycle::DaemonCtx;
use crate::protocol::{AgentInfo, Response};

pub(crate) struct AddAgentParams {
    pub repo: String,
    pub agent: String,
    pub role: String,
    pub worktree_path: PathBuf,
    pub window: String,
    pub session_id: String,
    pub pid: Option<i32>,
    pub task: Option<String>,
}

pub(crate) fn handle_add_agent<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    params: AddAgentParams,
) -> Response {
    if params.window.trim().is_empty() {
        return Response::error("tmux window must not be empty");
    }

    let role: AgentRole = match params.role.parse() {
        Ok(role) => role,
        Err(e) => return Response::error(e.to_string()),
    };

    // An agent either works in the main checkout or in its own worktree
    // strictly inside the repository's worktrees directory.
    if !worktree_path_allowed(ctx, &params.repo, &params.worktree_path) {
        return Response::error(format!(
            "worktree path {} is outside {} and is not the main checkout",
            params.worktree_path.display(),
            ctx.paths.worktree_dir(&params.repo).display(),
        ));
    }

    let mut record = AgentRecord::new(role, params.worktree_path, &params.window)
        .with_session_id(&params.session_id);
    if let Some(pid) = params.pid {
        record.pid = pid;
    }
    if let Some(task) = params.task {
        record.task = task;
    }

    match ctx.store.add_agent(&params.repo, &params.agent, record) {
        Ok(()) => Response::empty(),
        Err(e) => Response::error(e.to_string()),
    }
}

fn worktree_path_allowed<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo: &str,
    path: &Path,
) -> bool {
    if path == ctx.paths.repo_dir(repo) {
        return true;
    }
    let worktrees = ctx.paths.worktree_dir(repo);
    path.starts_with(&worktrees) && path != worktrees
}

/// Mark an agent for cleanup and wake the health monitor; the monitor
/// tears down the window and worktree and removes the record last.
pub(crate) fn handle_remove_agent<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo: &str,
    agent: &str,
) -> Response {
    match ctx.store.mark_ready_for_cleanup(repo, agent) {
        Ok(()) => {
            ctx.triggers.cleanup.notify_one();
            Response::empty()
        }
        Err(e) => Response::error(e.to_string()),
    }
}

pub(crate) fn handle_list_agents<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo: &str,
) -> Response {
    match ctx.store.list_agents(repo) {
        Ok(agents) => Response::ok(
            agents
                .into_iter()
                .map(|(name, record)| AgentInfo { name, record })
                .collect::<Vec<_>>(),
        ),
        Err(e) => Response::error(e.to_string()),
    }
}

/// Flag an agent done, tell the repository's supervisor, and schedule
/// resource cleanup.
pub(crate) fn handle_complete_agent<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo: &str,
    agent: &str,
) -> Response {
    let Some(repo_record) = ctx.store.get_repo(repo) else {
        return Response::error(format!("repository not found: {repo}"));
    };
    let Some(agent_record) = repo_record.agents.get(agent) else {
        return Response::error(format!("agent not found: {repo}/{agent}"));
    };

    if let Err(e) = ctx.store.mark_ready_for_cleanup(repo, agent) {
        return Response::error(e.to_string());
    }

    match repo_record.supervisor() {
        Some(supervisor) if supervisor != agent => {
            let body = completion_body(agent, &agent_record.task);
            if let Err(e) = ctx.messages.send(repo, agent, supervisor, &body) {
                warn!(repo, agent, "failed to send completion message: {e}");
            }
        }
        Some(_) => {}
        None => info!(repo, agent, "no supervisor to notify of completion"),
    }

    ctx.triggers.cleanup.notify_one();
    Response::empty()
}

fn completion_body(agent: &str, task: &str) -> String {
    if task.is_empty() {
        format!("Agent {agent} has completed its work and is ready for cleanup.")
    } else {
        format!("Agent {agent} has completed its task ({task}) and is ready for cleanup.")
    }
}
