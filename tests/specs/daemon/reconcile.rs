//! Worktree reconciliation: orphans removed, registered worktrees kept.

use crate::prelude::*;
use mc_daemon::loops::reconciler;
use tempfile::tempdir;

#[tokio::test]
async fn orphan_worktree_cleanup() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());
    register_demo_repo(&ctx);
    std::fs::create_dir_all(ctx.paths.repo_dir("demo")).unwrap();

    let real = ctx.paths.agent_worktree("demo", "real");
    let stray = ctx.paths.agent_worktree("demo", "stray");
    std::fs::create_dir_all(&real).unwrap();
    std::fs::create_dir_all(&stray).unwrap();
    ctx.git.register_worktree(&real);

    reconciler::run_pass(&ctx).await;

    assert!(!stray.exists(), "stray must be removed");
    assert!(real.is_dir(), "real must be retained");
}

#[tokio::test]
async fn empty_root_reconciles_without_errors_or_work() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());

    reconciler::run_pass(&ctx).await;

    assert!(ctx.git.calls().is_empty());
    assert!(ctx.terminal.calls().is_empty());
}
