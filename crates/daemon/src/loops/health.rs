// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitor.
//!
//! Probes agent processes and terminal windows, and tears down the
//! resources of dead or completed agents. The store entry is removed
//! strictly last: if the daemon crashes mid-cleanup, the next pass sees
//! the window absent and re-issues the remaining idempotent steps.

use std::collections::HashSet;
use std::sync::Arc;

use mc_adapters::{pid_alive, GitAdapter, TerminalAdapter};
use mc_core::AgentRecord;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::lifecycle::DaemonCtx;

pub async fn run<T: TerminalAdapter, G: GitAdapter>(
    ctx: Arc<DaemonCtx<T, G>>,
    cancel: CancellationToken,
) {
    let mut tick = super::ticker();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {}
            _ = ctx.triggers.cleanup.notified() => {}
        }
        run_pass(&ctx).await;
    }
}

/// One health pass over every agent in every repository.
pub async fn run_pass<T: TerminalAdapter, G: GitAdapter>(ctx: &DaemonCtx<T, G>) {
    let state = ctx.store.snapshot();
    for (repo_name, repo) in &state.repos {
        let session_alive = match ctx.terminal.has_session(&repo.tmux_session).await {
            Ok(alive) => alive,
            Err(e) => {
                // Terminal collaborator unavailable: skip the repo this tick.
                warn!(repo = %repo_name, "cannot probe session: {e}");
                continue;
            }
        };

        let mut doomed: Vec<(String, AgentRecord)> = Vec::new();
        for (agent_name, agent) in &repo.agents {
            if agent.ready_for_cleanup {
                doomed.push((agent_name.clone(), agent.clone()));
                continue;
            }
            if is_dead(ctx, repo, agent, session_alive).await {
                info!(repo = %repo_name, agent = %agent_name, "agent is dead, scheduling cleanup");
                if let Err(e) = ctx.store.mark_ready_for_cleanup(repo_name, agent_name) {
                    warn!(repo = %repo_name, agent = %agent_name, "cannot mark for cleanup: {e}");
                    continue;
                }
                doomed.push((agent_name.clone(), agent.clone()));
            }
        }

        for (agent_name, agent) in doomed {
            cleanup_agent(ctx, repo_name, &repo.tmux_session, &agent_name, &agent).await;
        }

        sweep_orphaned_messages(ctx, repo_name).await;
    }
}

async fn is_dead<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo: &mc_core::RepoRecord,
    agent: &AgentRecord,
    session_alive: bool,
) -> bool {
    if agent.pid > 0 && !pid_alive(agent.pid) {
        return true;
    }
    if !session_alive {
        return true;
    }
    match ctx.terminal.has_window(&repo.tmux_session, &agent.tmux_window).await {
        Ok(present) => !present,
        Err(e) => {
            warn!(window = %agent.tmux_window, "cannot probe window: {e}");
            false
        }
    }
}

/// Tear down one agent's resources, then drop its record.
///
/// Every step before the store removal is idempotent, so a crash between
/// steps is repaired by the next pass.
async fn cleanup_agent<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo_name: &str,
    session: &str,
    agent_name: &str,
    agent: &AgentRecord,
) {
    let _ = ctx.terminal.stop_capture(session, &agent.tmux_window).await;
    if let Err(e) = ctx.terminal.kill_window(session, &agent.tmux_window).await {
        warn!(agent = %agent_name, "failed to kill window: {e}");
    }

    remove_worktree(ctx, repo_name, agent_name, agent).await;

    if let Err(e) = ctx.messages.delete_acked(repo_name, agent_name) {
        warn!(agent = %agent_name, "failed to purge acknowledged messages: {e}");
    }

    // Store removal is last so the pass stays re-runnable after a crash.
    match ctx.store.remove_agent(repo_name, agent_name) {
        Ok(_) => info!(repo = %repo_name, agent = %agent_name, "agent cleaned up"),
        Err(e) => warn!(repo = %repo_name, agent = %agent_name, "failed to remove agent: {e}"),
    }
}

/// Version-control-aware worktree removal, unlinking the tree as a
/// fallback. Only paths strictly inside the repository's worktrees
/// directory are touched; the main checkout never is.
async fn remove_worktree<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo_name: &str,
    agent_name: &str,
    agent: &AgentRecord,
) {
    let worktree = &agent.worktree_path;
    let worktrees_dir = ctx.paths.worktree_dir(repo_name);
    if worktree.as_os_str().is_empty()
        || *worktree == ctx.paths.repo_dir(repo_name)
        || !worktree.starts_with(&worktrees_dir)
        || *worktree == worktrees_dir
    {
        return;
    }

    if let Err(e) = ctx.git.remove_worktree(worktree, true).await {
        if worktree.exists() {
            warn!(agent = %agent_name, "worktree removal failed ({e}), unlinking tree");
            if let Err(e) = std::fs::remove_dir_all(worktree) {
                warn!(path = %worktree.display(), "failed to unlink worktree: {e}");
            }
        }
    }
}

/// Drop message directories whose recipient no longer exists.
async fn sweep_orphaned_messages<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo_name: &str,
) {
    let valid: HashSet<String> = match ctx.store.list_agents(repo_name) {
        Ok(agents) => agents.into_iter().map(|(name, _)| name).collect(),
        // Repo itself vanished mid-pass; the next tick handles it.
        Err(_) => return,
    };
    match ctx.messages.cleanup_orphaned(repo_name, &valid) {
        Ok(0) => {}
        Ok(removed) => info!(repo = %repo_name, removed, "removed orphaned message directories"),
        Err(e) => warn!(repo = %repo_name, "message cleanup failed: {e}"),
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
