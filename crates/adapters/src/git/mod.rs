// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version-control adapters for worktree lifecycle operations.

mod cli;

pub use cli::GitCliAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGitAdapter, GitCall};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from version-control operations.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),
    #[error("git command failed: {0}")]
    CommandFailed(String),
}

/// Adapter over the version-control system's worktree primitives.
#[async_trait]
pub trait GitAdapter: Clone + Send + Sync + 'static {
    /// Absolute paths of all worktrees registered to `repo`, including the
    /// main checkout.
    async fn list_worktrees(&self, repo: &Path) -> Result<Vec<PathBuf>, GitError>;

    /// Whether `path` is a worktree registered to `repo`.
    async fn is_registered_worktree(&self, repo: &Path, path: &Path) -> Result<bool, GitError>;

    /// Remove the worktree at `path`, detaching it from its repository.
    async fn remove_worktree(&self, path: &Path, force: bool) -> Result<(), GitError>;

    /// Drop stale worktree registrations whose directories are gone.
    async fn prune_worktrees(&self, repo: &Path) -> Result<(), GitError>;

    /// Fast-forward a worktree onto the primary branch's upstream.
    async fn sync_from_primary(&self, worktree: &Path) -> Result<(), GitError>;

    /// Delete local branches whose work is merged into the primary.
    /// A repository without a remote is left alone.
    async fn cleanup_merged_branches(&self, repo: &Path) -> Result<(), GitError>;

    /// Name of the branch checked out at `path`.
    async fn current_branch(&self, path: &Path) -> Result<String, GitError>;

    /// Whether `path` has uncommitted changes.
    async fn has_uncommitted(&self, path: &Path) -> Result<bool, GitError>;
}
