// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters.
//!
//! Agents are addressed by `(session, window)`: one tmux session per
//! repository, one window per agent.

mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTerminalAdapter, TerminalCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from terminal operations.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("session or window not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for managing terminal sessions and windows.
#[async_trait]
pub trait TerminalAdapter: Clone + Send + Sync + 'static {
    /// Create a detached session whose first window starts in `cwd`.
    async fn create_session(&self, session: &str, cwd: &Path) -> Result<(), TerminalError>;

    /// Kill a session. Killing an absent session is not an error.
    async fn kill_session(&self, session: &str) -> Result<(), TerminalError>;

    /// Check whether a session exists.
    async fn has_session(&self, session: &str) -> Result<bool, TerminalError>;

    /// Create a named window inside an existing session.
    async fn create_window(
        &self,
        session: &str,
        window: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError>;

    /// Kill a window. Killing an absent window is not an error.
    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError>;

    /// Check whether a named window exists inside a session.
    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError>;

    /// Paste `text` into a window and submit it as one operation.
    ///
    /// The paste and the submit keystroke are issued in a single
    /// multiplexer invocation so the submit can never be lost between
    /// them.
    async fn send_text_then_submit(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError>;

    /// Process id of the window's pane.
    async fn pane_pid(&self, session: &str, window: &str) -> Result<i32, TerminalError>;

    /// Start appending the window's output to `file`.
    async fn start_capture(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError>;

    /// Stop a capture started with [`TerminalAdapter::start_capture`].
    async fn stop_capture(&self, session: &str, window: &str) -> Result<(), TerminalError>;
}
