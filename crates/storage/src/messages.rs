// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed inter-agent message log.
//!
//! Layout: `<root>/<repo>/<recipient>/<message-id>`, one JSON document per
//! file. The directory location is the routing table: scanning a
//! recipient's directory yields exactly that recipient's inbox. Files are
//! written atomically (tmp + rename) so a reader never sees a torn write;
//! a file that still fails to parse is skipped with a warning, never an
//! error — the log must survive one bad entry.

use chrono::Utc;
use mc_core::{Message, MessageStatus};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors from message store operations.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message not found: {0}")]
    NotFound(String),
}

/// Append/scan/update log of messages under a messages root directory.
#[derive(Debug, Clone)]
pub struct MessageStore {
    root: PathBuf,
}

impl MessageStore {
    /// `root` is the daemon's messages directory (`<root>/messages`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn agent_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.root.join(repo).join(agent)
    }

    fn message_path(&self, repo: &str, agent: &str, id: &str) -> PathBuf {
        self.agent_dir(repo, agent).join(id)
    }

    /// Create a pending message addressed to `to`.
    pub fn send(
        &self,
        repo: &str,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<Message, MessageError> {
        let message = Message::new(from, to, body);
        let dir = self.agent_dir(repo, to);
        fs::create_dir_all(&dir)?;
        write_message(&dir.join(&message.id), &message)?;
        Ok(message)
    }

    /// All messages addressed to `agent`, ordered by timestamp.
    pub fn list(&self, repo: &str, agent: &str) -> Result<Vec<Message>, MessageError> {
        let dir = self.agent_dir(repo, agent);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            // Leftover from a crashed atomic write; the rename never happened.
            if path.extension().is_some_and(|ext| ext == "tmp") {
                continue;
            }
            match read_message(&path) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparseable message file");
                }
            }
        }

        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    /// Messages addressed to `agent` with status pending or delivered.
    pub fn list_unread(&self, repo: &str, agent: &str) -> Result<Vec<Message>, MessageError> {
        let mut messages = self.list(repo, agent)?;
        messages.retain(|m| m.status.is_unread());
        Ok(messages)
    }

    pub fn get(&self, repo: &str, agent: &str, id: &str) -> Result<Message, MessageError> {
        let path = self.message_path(repo, agent, id);
        if !path.is_file() {
            return Err(MessageError::NotFound(id.to_string()));
        }
        read_message(&path)
    }

    /// Advance a message to a new status. Fails if the message is unknown.
    pub fn update_status(
        &self,
        repo: &str,
        agent: &str,
        id: &str,
        status: MessageStatus,
    ) -> Result<Message, MessageError> {
        let path = self.message_path(repo, agent, id);
        if !path.is_file() {
            return Err(MessageError::NotFound(id.to_string()));
        }
        let mut message = read_message(&path)?;
        message.status = status;
        write_message(&path, &message)?;
        Ok(message)
    }

    /// Acknowledge a message, stamping `acked_at`. A second acknowledgement
    /// is a no-op.
    pub fn ack(&self, repo: &str, agent: &str, id: &str) -> Result<Message, MessageError> {
        let path = self.message_path(repo, agent, id);
        if !path.is_file() {
            return Err(MessageError::NotFound(id.to_string()));
        }
        let mut message = read_message(&path)?;
        if message.status == MessageStatus::Acknowledged {
            return Ok(message);
        }
        message.status = MessageStatus::Acknowledged;
        message.acked_at = Some(Utc::now());
        write_message(&path, &message)?;
        Ok(message)
    }

    /// Delete a message. Deleting an absent message is not an error.
    pub fn delete(&self, repo: &str, agent: &str, id: &str) -> Result<(), MessageError> {
        match fs::remove_file(self.message_path(repo, agent, id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Purge acknowledged messages for `agent`, returning how many.
    pub fn delete_acked(&self, repo: &str, agent: &str) -> Result<usize, MessageError> {
        let mut purged = 0;
        for message in self.list(repo, agent)? {
            if message.status == MessageStatus::Acknowledged {
                self.delete(repo, agent, &message.id)?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Remove recipient directories that do not belong to a valid agent.
    ///
    /// Plain files in the repository message dir are left untouched.
    pub fn cleanup_orphaned(
        &self,
        repo: &str,
        valid_agents: &HashSet<String>,
    ) -> Result<usize, MessageError> {
        let repo_dir = self.root.join(repo);
        let entries = match fs::read_dir(&repo_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !valid_agents.contains(&name) {
                fs::remove_dir_all(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_message(path: &Path) -> Result<Message, MessageError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_message(path: &Path, message: &Message) -> Result<(), MessageError> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, serde_json::to_vec_pretty(message)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
