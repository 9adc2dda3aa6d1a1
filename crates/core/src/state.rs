// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level daemon state, as persisted to `state.json`.

use crate::repo::RepoRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the daemon knows, keyed by repository name.
///
/// This is the single authority for "which agents exist"; background loops
/// reconcile external resources toward it, never the reverse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub repos: HashMap<String, RepoRecord>,
    /// Daemon-wide default repository selector for the front-end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_repo: Option<String>,
}
