// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mc-core: Core types for the multiclaude daemon.
//!
//! Pure data: path derivation, repository/agent records, and message
//! records. No I/O beyond `Paths::ensure_directories`.

pub mod agent;
pub mod message;
pub mod paths;
pub mod repo;
pub mod state;

pub use agent::{AgentRecord, AgentRole};
pub use message::{Message, MessageStatus};
pub use paths::Paths;
pub use repo::{MergeQueueConfig, RepoRecord, TrackMode};
pub use state::State;
