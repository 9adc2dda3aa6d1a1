//! Shared helpers for the behavioral specs.

use std::path::Path;
use std::sync::Arc;

use mc_adapters::{FakeGitAdapter, FakeTerminalAdapter};
use mc_core::Paths;
use mc_daemon::DaemonCtx;
use mc_storage::StateStore;

pub type TestDaemon = DaemonCtx<FakeTerminalAdapter, FakeGitAdapter>;

/// Build a daemon context over fakes, rooted in `root`.
pub fn daemon_at(root: &Path) -> Arc<TestDaemon> {
    let paths = Paths::new(root);
    paths.ensure_directories().unwrap();
    let store = StateStore::load(paths.state_file()).unwrap();
    Arc::new(DaemonCtx::new(
        paths,
        store,
        FakeTerminalAdapter::new(),
        FakeGitAdapter::new(),
    ))
}

/// Register the `demo` repository with its tmux session present.
pub fn register_demo_repo(ctx: &TestDaemon) {
    ctx.store
        .add_repo(
            "demo",
            mc_core::RepoRecord::new("git@example.com:demo.git", "mc-demo"),
        )
        .unwrap();
    ctx.terminal.add_session("mc-demo");
}
