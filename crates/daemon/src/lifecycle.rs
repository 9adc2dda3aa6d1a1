// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, shared context.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mc_adapters::{GitAdapter, GitCliAdapter, TerminalAdapter, TmuxAdapter};
use mc_core::Paths;
use mc_storage::{MessageStore, StateStore};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::env;
use crate::pidfile::{PidFile, PidFileError};

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: Paths,
}

impl Config {
    /// Resolve the state root.
    ///
    /// `$MULTICLAUDE_ROOT` wins; otherwise `$XDG_STATE_HOME/multiclaude`,
    /// falling back to `~/.local/state/multiclaude`. One daemon serves all
    /// repositories for a user.
    pub fn load() -> Result<Self, LifecycleError> {
        let root = match env::state_root() {
            Some(root) => root,
            None => default_state_root().ok_or(LifecycleError::NoStateDir)?,
        };
        Ok(Self {
            paths: Paths::new(root),
        })
    }
}

fn default_state_root() -> Option<PathBuf> {
    if let Some(state_home) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(state_home).join("multiclaude"));
    }
    Some(dirs::home_dir()?.join(".local/state/multiclaude"))
}

/// Coalescing wake channels for the triggerable loops.
///
/// `Notify` stores at most one pending permit: triggers raised while a
/// pass is running collapse into a single follow-up pass, and raising one
/// never blocks the caller.
#[derive(Default)]
pub struct Triggers {
    /// Wakes the health monitor.
    pub cleanup: Notify,
    /// Wakes the worktree reconciler.
    pub reconcile: Notify,
}

/// Shared daemon context handed to the listener and every loop.
pub struct DaemonCtx<T: TerminalAdapter, G: GitAdapter> {
    pub paths: Paths,
    pub store: StateStore,
    pub messages: MessageStore,
    pub terminal: T,
    pub git: G,
    pub triggers: Triggers,
    pub start_time: Instant,
    /// Fired by the `stop` handler after its response is written.
    pub shutdown: Notify,
}

impl<T: TerminalAdapter, G: GitAdapter> DaemonCtx<T, G> {
    pub fn new(paths: Paths, store: StateStore, terminal: T, git: G) -> Self {
        let messages = MessageStore::new(paths.messages_dir());
        Self {
            paths,
            store,
            messages,
            terminal,
            git,
            triggers: Triggers::default(),
            start_time: Instant::now(),
            shutdown: Notify::new(),
        }
    }
}

/// Context type of the production daemon.
pub type Daemon = DaemonCtx<TmuxAdapter, GitCliAdapter>;

/// Result of daemon startup.
pub struct Startup {
    pub ctx: Arc<Daemon>,
    pub pid_file: PidFile,
    /// The bound Unix socket, to be wrapped in a [`crate::Listener`].
    pub socket: UnixListener,
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error(transparent)]
    Pid(#[from] PidFileError),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error(transparent)]
    State(#[from] mc_storage::StateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon: directories, pid file, state, socket.
pub async fn startup(config: &Config) -> Result<Startup, LifecycleError> {
    config.paths.ensure_directories()?;

    // Claim the pid file FIRST - prevents a second instance racing the
    // socket takeover below.
    let pid_file = PidFile::claim(config.paths.daemon_pid())?;

    match startup_inner(config).await {
        Ok((ctx, socket)) => Ok(Startup {
            ctx,
            pid_file,
            socket,
        }),
        Err(e) => {
            // The lock is ours; don't leave it behind on a failed start.
            if let Err(release_err) = pid_file.release() {
                warn!("Failed to release pid file after startup error: {release_err}");
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<(Arc<Daemon>, UnixListener), LifecycleError> {
    // Malformed state is fatal; a missing file is an empty daemon.
    let store = StateStore::load(config.paths.state_file())?;
    let state = store.snapshot();
    info!(
        repos = state.repos.len(),
        agents = state.repos.values().map(|r| r.agents.len()).sum::<usize>(),
        "loaded state"
    );

    // The pid claim succeeded, so any socket on disk is stale.
    let socket_path = config.paths.daemon_socket();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let socket = UnixListener::bind(&socket_path)
        .map_err(|e| LifecycleError::BindFailed(socket_path.clone(), e))?;
    restrict_socket_mode(&socket_path)?;

    let ctx = Arc::new(DaemonCtx::new(
        config.paths.clone(),
        store,
        TmuxAdapter::new(),
        GitCliAdapter::new(),
    ));

    Ok((ctx, socket))
}

#[cfg(unix)]
fn restrict_socket_mode(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_socket_mode(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

/// Shut the daemon down gracefully: persist state, remove the socket,
/// release the pid file. Each step is best-effort so a failure in one
/// never strands the others.
pub fn shutdown<T: TerminalAdapter, G: GitAdapter>(ctx: &DaemonCtx<T, G>, pid_file: &PidFile) {
    info!("Shutting down daemon...");

    if let Err(e) = ctx.store.save() {
        warn!("Failed to persist state on shutdown: {e}");
    }

    let socket_path = ctx.paths.daemon_socket();
    if socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&socket_path) {
            warn!("Failed to remove socket file: {e}");
        }
    }

    if let Err(e) = pid_file.release() {
        warn!("Failed to remove pid file: {e}");
    }

    info!("Daemon shutdown complete");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
