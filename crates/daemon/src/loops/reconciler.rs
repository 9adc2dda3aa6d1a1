// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree reconciler.
//!
//! Brings the on-disk worktrees into agreement with the state store and
//! the version-control system: refreshes worker checkouts from the
//! primary, deletes orphaned worktree directories, and prunes merged
//! branches. The pass is idempotent; with no external changes it
//! performs no mutations.

use std::path::Path;
use std::sync::Arc;

use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_core::{AgentRole, RepoRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

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
            _ = ctx.triggers.reconcile.notified() => {}
        }
        run_pass(&ctx).await;
    }
}

/// One reconciliation pass over every repository whose main checkout
/// exists on disk. Absence of directories or repositories is not an
/// error.
pub async fn run_pass<T: TerminalAdapter, G: GitAdapter>(ctx: &DaemonCtx<T, G>) {
    let state = ctx.store.snapshot();
    for (repo_name, repo) in &state.repos {
        let repo_dir = ctx.paths.repo_dir(repo_name);
        if !repo_dir.exists() {
            debug!(repo = %repo_name, "main checkout missing, skipping");
            continue;
        }

        refresh_workers(ctx, repo_name, repo, &repo_dir).await;
        cleanup_orphan_worktrees(ctx, repo_name, &repo_dir).await;

        if let Err(e) = ctx.git.cleanup_merged_branches(&repo_dir).await {
            warn!(repo = %repo_name, "merged-branch cleanup failed: {e}");
        }
    }
}

/// Best-effort sync of every worker worktree from the primary branch.
///
/// Skipped without error: empty worktree paths, paths that do not exist,
/// and agents operating directly on the main checkout.
async fn refresh_workers<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo_name: &str,
    repo: &RepoRecord,
    repo_dir: &Path,
) {
    for (agent_name, agent) in &repo.agents {
        if agent.role != AgentRole::Worker {
            continue;
        }
        let worktree = &agent.worktree_path;
        if worktree.as_os_str().is_empty() || !worktree.exists() || worktree == repo_dir {
            continue;
        }
        if let Err(e) = ctx.git.sync_from_primary(worktree).await {
            warn!(repo = %repo_name, agent = %agent_name, "worktree sync failed: {e}");
        }
    }
}

/// Remove immediate subdirectories of the repository's worktrees dir
/// that the version-control system does not know about.
async fn cleanup_orphan_worktrees<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    repo_name: &str,
    repo_dir: &Path,
) {
    if let Err(e) = ctx.git.prune_worktrees(repo_dir).await {
        warn!(repo = %repo_name, "worktree prune failed: {e}");
    }

    let worktrees_dir = ctx.paths.worktree_dir(repo_name);
    let entries = match std::fs::read_dir(&worktrees_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(repo = %repo_name, "cannot scan worktrees dir: {e}");
            return;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(repo = %repo_name, "cannot read worktree entry: {e}");
                continue;
            }
        };
        if !path.is_dir() {
            continue;
        }

        match ctx.git.is_registered_worktree(repo_dir, &path).await {
            Ok(true) => {}
            Ok(false) => {
                info!(repo = %repo_name, path = %path.display(), "removing orphaned worktree");
                if let Err(e) = std::fs::remove_dir_all(&path) {
                    warn!(path = %path.display(), "failed to remove orphan: {e}");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), "cannot query worktree registration: {e}");
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
