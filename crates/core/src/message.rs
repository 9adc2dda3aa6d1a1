// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent message records.
//!
//! A message lives as a single JSON file under
//! `<messages>/<repo>/<recipient>/<id>`; the on-disk location encodes the
//! recipient, so scanning a directory yields exactly that agent's inbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Written but not yet pasted into the recipient's terminal.
    Pending,
    /// Pasted into the recipient's terminal.
    Delivered,
    /// The recipient reported reading it.
    Read,
    /// The recipient acknowledged it; eligible for purge.
    Acknowledged,
}

impl MessageStatus {
    /// Pending and delivered messages count as unread.
    pub fn is_unread(&self) -> bool {
        matches!(self, MessageStatus::Pending | MessageStatus::Delivered)
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Delivered => write!(f, "delivered"),
            MessageStatus::Read => write!(f, "read"),
            MessageStatus::Acknowledged => write!(f, "acknowledged"),
        }
    }
}

/// A single inter-agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub acked_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a fresh pending message with a unique id.
    pub fn new(from: &str, to: &str, body: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
            body: body.to_string(),
            status: MessageStatus::Pending,
            acked_at: None,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
