// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git adapter shelling out to the `git` binary.

use super::{GitAdapter, GitError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Branch names never deleted by merged-branch cleanup.
const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

/// Git adapter using the `git` CLI.
#[derive(Clone, Default)]
pub struct GitCliAdapter;

impl GitCliAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn run_git(cwd: &Path, args: &[&str]) -> Result<std::process::Output, GitError> {
    if !cwd.exists() {
        return Err(GitError::NotARepository(cwd.to_path_buf()));
    }
    Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .await
        .map_err(|e| GitError::CommandFailed(e.to_string()))
}

async fn run_git_checked(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = run_git(cwd, args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed(format!(
            "git {}: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Compare two paths, resolving symlinks where possible.
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[async_trait]
impl GitAdapter for GitCliAdapter {
    async fn list_worktrees(&self, repo: &Path) -> Result<Vec<PathBuf>, GitError> {
        let stdout = run_git_checked(repo, &["worktree", "list", "--porcelain"]).await?;
        Ok(stdout
            .lines()
            .filter_map(|line| line.strip_prefix("worktree "))
            .map(PathBuf::from)
            .collect())
    }

    async fn is_registered_worktree(&self, repo: &Path, path: &Path) -> Result<bool, GitError> {
        let worktrees = self.list_worktrees(repo).await?;
        Ok(worktrees.iter().any(|wt| same_path(wt, path)))
    }

    async fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), GitError> {
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(".");
        run_git_checked(path, &args).await?;
        Ok(())
    }

    async fn prune_worktrees(&self, repo: &Path) -> Result<(), GitError> {
        run_git_checked(repo, &["worktree", "prune"]).await?;
        Ok(())
    }

    async fn sync_from_primary(&self, worktree: &Path) -> Result<(), GitError> {
        run_git_checked(worktree, &["fetch", "origin"]).await?;
        // Fast-forward only: a worktree with local commits is left alone.
        run_git_checked(worktree, &["merge", "--ff-only", "@{upstream}"]).await?;
        Ok(())
    }

    async fn cleanup_merged_branches(&self, repo: &Path) -> Result<(), GitError> {
        let remotes = run_git_checked(repo, &["remote"]).await?;
        if remotes.trim().is_empty() {
            return Ok(());
        }

        let current = self.current_branch(repo).await?;
        let merged = run_git_checked(repo, &["branch", "--merged"]).await?;
        for line in merged.lines() {
            let branch = line.trim_start_matches('*').trim();
            if branch.is_empty()
                || branch == current
                || PROTECTED_BRANCHES.contains(&branch)
            {
                continue;
            }
            run_git_checked(repo, &["branch", "-d", branch]).await?;
        }
        Ok(())
    }

    async fn current_branch(&self, path: &Path) -> Result<String, GitError> {
        let stdout = run_git_checked(path, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(stdout.trim().to_string())
    }

    async fn has_uncommitted(&self, path: &Path) -> Result<bool, GitError> {
        let stdout = run_git_checked(path, &["status", "--porcelain"]).await?;
        Ok(!stdout.trim().is_empty())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
