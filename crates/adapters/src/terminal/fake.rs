// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake terminal adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TerminalAdapter, TerminalError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded terminal call.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCall {
    CreateSession {
        session: String,
        cwd: PathBuf,
    },
    KillSession {
        session: String,
    },
    CreateWindow {
        session: String,
        window: String,
        cwd: PathBuf,
    },
    KillWindow {
        session: String,
        window: String,
    },
    SendTextThenSubmit {
        session: String,
        window: String,
        text: String,
    },
    StartCapture {
        session: String,
        window: String,
        file: PathBuf,
    },
    StopCapture {
        session: String,
        window: String,
    },
}

#[derive(Default)]
struct FakeTerminalState {
    /// Session name → set of window names.
    sessions: HashMap<String, HashSet<String>>,
    /// `(session, window)` → pane pid.
    pane_pids: HashMap<(String, String), i32>,
    calls: Vec<TerminalCall>,
}

/// Fake terminal adapter recording every mutation, for tests.
#[derive(Clone, Default)]
pub struct FakeTerminalAdapter {
    inner: Arc<Mutex<FakeTerminalState>>,
}

impl FakeTerminalAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<TerminalCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded atomic pastes, in order.
    pub fn pastes(&self) -> Vec<TerminalCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, TerminalCall::SendTextThenSubmit { .. }))
            .cloned()
            .collect()
    }

    /// Register a pre-existing session.
    pub fn add_session(&self, session: &str) {
        self.inner
            .lock()
            .sessions
            .entry(session.to_string())
            .or_default();
    }

    /// Register a pre-existing window, creating the session if needed.
    pub fn add_window(&self, session: &str, window: &str) {
        self.inner
            .lock()
            .sessions
            .entry(session.to_string())
            .or_default()
            .insert(window.to_string());
    }

    /// Remove a window without recording a kill call.
    pub fn drop_window(&self, session: &str, window: &str) {
        if let Some(windows) = self.inner.lock().sessions.get_mut(session) {
            windows.remove(window);
        }
    }

    /// Remove a session without recording a kill call.
    pub fn drop_session(&self, session: &str) {
        self.inner.lock().sessions.remove(session);
    }

    pub fn set_pane_pid(&self, session: &str, window: &str, pid: i32) {
        self.inner
            .lock()
            .pane_pids
            .insert((session.to_string(), window.to_string()), pid);
    }
}

#[async_trait]
impl TerminalAdapter for FakeTerminalAdapter {
    async fn create_session(&self, session: &str, cwd: &Path) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::CreateSession {
            session: session.to_string(),
            cwd: cwd.to_path_buf(),
        });
        inner.sessions.entry(session.to_string()).or_default();
        Ok(())
    }

    async fn kill_session(&self, session: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::KillSession {
            session: session.to_string(),
        });
        inner.sessions.remove(session);
        Ok(())
    }

    async fn has_session(&self, session: &str) -> Result<bool, TerminalError> {
        Ok(self.inner.lock().sessions.contains_key(session))
    }

    async fn create_window(
        &self,
        session: &str,
        window: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::CreateWindow {
            session: session.to_string(),
            window: window.to_string(),
            cwd: cwd.to_path_buf(),
        });
        match inner.sessions.get_mut(session) {
            Some(windows) => {
                windows.insert(window.to_string());
                Ok(())
            }
            None => Err(TerminalError::NotFound(session.to_string())),
        }
    }

    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::KillWindow {
            session: session.to_string(),
            window: window.to_string(),
        });
        if let Some(windows) = inner.sessions.get_mut(session) {
            windows.remove(window);
        }
        Ok(())
    }

    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(session)
            .is_some_and(|windows| windows.contains(window)))
    }

    async fn send_text_then_submit(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        let present = inner
            .sessions
            .get(session)
            .is_some_and(|windows| windows.contains(window));
        if !present {
            return Err(TerminalError::NotFound(format!("{session}:{window}")));
        }
        inner.calls.push(TerminalCall::SendTextThenSubmit {
            session: session.to_string(),
            window: window.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn pane_pid(&self, session: &str, window: &str) -> Result<i32, TerminalError> {
        self.inner
            .lock()
            .pane_pids
            .get(&(session.to_string(), window.to_string()))
            .copied()
            .ok_or_else(|| TerminalError::NotFound(format!("{session}:{window}")))
    }

    async fn start_capture(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::StartCapture {
            session: session.to_string(),
            window: window.to_string(),
            file: file.to_path_buf(),
        });
        Ok(())
    }

    async fn stop_capture(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::StopCapture {
            session: session.to_string(),
            window: window.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
