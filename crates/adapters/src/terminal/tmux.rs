// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux terminal adapter.

use super::{TerminalAdapter, TerminalError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Paste buffer name used for atomic text+submit delivery.
const PASTE_BUFFER: &str = "mc-paste";

/// Tmux-based terminal adapter.
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn target(session: &str, window: &str) -> String {
    format!("{session}:{window}")
}

async fn run_tmux(args: &[&str]) -> Result<std::process::Output, TerminalError> {
    Command::new("tmux")
        .args(args)
        .output()
        .await
        .map_err(|e| TerminalError::CommandFailed(e.to_string()))
}

#[async_trait]
impl TerminalAdapter for TmuxAdapter {
    async fn create_session(&self, session: &str, cwd: &Path) -> Result<(), TerminalError> {
        if !cwd.exists() {
            return Err(TerminalError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let cwd_str = cwd.display().to_string();
        let output = run_tmux(&["new-session", "-d", "-s", session, "-c", &cwd_str]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session, stderr = %stderr, "tmux new-session failed");
            return Err(TerminalError::SpawnFailed(stderr.to_string()));
        }
        Ok(())
    }

    async fn kill_session(&self, session: &str) -> Result<(), TerminalError> {
        // Session might already be dead, which is fine
        let _ = run_tmux(&["kill-session", "-t", session]).await?;
        Ok(())
    }

    async fn has_session(&self, session: &str) -> Result<bool, TerminalError> {
        let output = run_tmux(&["has-session", "-t", session]).await?;
        Ok(output.status.success())
    }

    async fn create_window(
        &self,
        session: &str,
        window: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError> {
        let cwd_str = cwd.display().to_string();
        let output = run_tmux(&["new-window", "-t", session, "-n", window, "-c", &cwd_str]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session, window, stderr = %stderr, "tmux new-window failed");
            return Err(TerminalError::SpawnFailed(stderr.to_string()));
        }
        Ok(())
    }

    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let _ = run_tmux(&["kill-window", "-t", &target(session, window)]).await?;
        Ok(())
    }

    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError> {
        let output = run_tmux(&["list-windows", "-t", session, "-F", "#{window_name}"]).await?;
        if !output.status.success() {
            // Session itself is gone
            return Ok(false);
        }
        let names = String::from_utf8_lossy(&output.stdout);
        Ok(names.lines().any(|name| name == window))
    }

    async fn send_text_then_submit(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        // One tmux client invocation: load the text into a buffer from
        // stdin, paste it into the target, and press Enter. tmux executes
        // the three commands back to back, so the Enter cannot be lost
        // between the paste and a concurrent writer.
        let target = target(session, window);
        let mut child = Command::new("tmux")
            .args([
                "load-buffer",
                "-b",
                PASTE_BUFFER,
                "-",
                ";",
                "paste-buffer",
                "-b",
                PASTE_BUFFER,
                "-d",
                "-t",
                &target,
                ";",
                "send-keys",
                "-t",
                &target,
                "Enter",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(target));
        }
        Ok(())
    }

    async fn pane_pid(&self, session: &str, window: &str) -> Result<i32, TerminalError> {
        let target = target(session, window);
        let output = run_tmux(&["list-panes", "-t", &target, "-F", "#{pane_pid}"]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(target));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .next()
            .and_then(|line| line.trim().parse().ok())
            .ok_or_else(|| TerminalError::CommandFailed(format!("no pane pid for {target}")))
    }

    async fn start_capture(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError> {
        let target = target(session, window);
        let sink = format!("cat >> '{}'", file.display());
        let output = run_tmux(&["pipe-pane", "-t", &target, "-o", &sink]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(target));
        }
        Ok(())
    }

    async fn stop_capture(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        // pipe-pane with no command closes the existing pipe
        let target = target(session, window);
        let output = run_tmux(&["pipe-pane", "-t", &target]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(target));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
