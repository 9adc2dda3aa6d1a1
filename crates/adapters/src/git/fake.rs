// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake git adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{GitAdapter, GitError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded git call.
#[derive(Debug, Clone, PartialEq)]
pub enum GitCall {
    RemoveWorktree { path: PathBuf, force: bool },
    PruneWorktrees { repo: PathBuf },
    SyncFromPrimary { worktree: PathBuf },
    CleanupMergedBranches { repo: PathBuf },
}

#[derive(Default)]
struct FakeGitState {
    /// Registered worktree paths across all repos.
    registered: HashSet<PathBuf>,
    /// Worktree paths whose removal should fail (exercises the
    /// remove-then-unlink fallback).
    failing_removals: HashSet<PathBuf>,
    /// Paths with uncommitted changes.
    dirty: HashSet<PathBuf>,
    calls: Vec<GitCall>,
}

/// Fake git adapter with a configurable registered-worktree set.
#[derive(Clone, Default)]
pub struct FakeGitAdapter {
    inner: Arc<Mutex<FakeGitState>>,
}

impl FakeGitAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.inner.lock().calls.clone()
    }

    pub fn register_worktree(&self, path: impl Into<PathBuf>) {
        self.inner.lock().registered.insert(path.into());
    }

    pub fn fail_removal_of(&self, path: impl Into<PathBuf>) {
        self.inner.lock().failing_removals.insert(path.into());
    }

    pub fn set_dirty(&self, path: impl Into<PathBuf>) {
        self.inner.lock().dirty.insert(path.into());
    }

    /// Worktrees synced from the primary so far.
    pub fn synced(&self) -> Vec<PathBuf> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                GitCall::SyncFromPrimary { worktree } => Some(worktree.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl GitAdapter for FakeGitAdapter {
    async fn list_worktrees(&self, _repo: &Path) -> Result<Vec<PathBuf>, GitError> {
        let mut worktrees: Vec<PathBuf> = self.inner.lock().registered.iter().cloned().collect();
        worktrees.sort();
        Ok(worktrees)
    }

    async fn is_registered_worktree(&self, _repo: &Path, path: &Path) -> Result<bool, GitError> {
        Ok(self.inner.lock().registered.contains(path))
    }

    async fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), GitError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GitCall::RemoveWorktree {
            path: path.to_path_buf(),
            force,
        });
        if inner.failing_removals.contains(path) {
            return Err(GitError::CommandFailed(format!(
                "cannot remove {}",
                path.display()
            )));
        }
        inner.registered.remove(path);
        let _ = std::fs::remove_dir_all(path);
        Ok(())
    }

    async fn prune_worktrees(&self, repo: &Path) -> Result<(), GitError> {
        self.inner.lock().calls.push(GitCall::PruneWorktrees {
            repo: repo.to_path_buf(),
        });
        Ok(())
    }

    async fn sync_from_primary(&self, worktree: &Path) -> Result<(), GitError> {
        self.inner.lock().calls.push(GitCall::SyncFromPrimary {
            worktree: worktree.to_path_buf(),
        });
        Ok(())
    }

    async fn cleanup_merged_branches(&self, repo: &Path) -> Result<(), GitError> {
        self.inner
            .lock()
            .calls
            .push(GitCall::CleanupMergedBranches {
                repo: repo.to_path_buf(),
            });
        Ok(())
    }

    async fn current_branch(&self, _path: &Path) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    async fn has_uncommitted(&self, path: &Path) -> Result<bool, GitError> {
        Ok(self.inner.lock().dirty.contains(path))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
