// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mc-adapters: Adapters over the daemon's external collaborators.
//!
//! The daemon never shells out directly; everything that touches tmux,
//! git, the process table, or agent-definition files goes through the
//! traits here so the loops and handlers can be tested against fakes.

pub mod definitions;
pub mod git;
pub mod process;
pub mod terminal;

pub use definitions::{load_definitions, AgentDefinition, DefinitionOrigin};
pub use git::{GitAdapter, GitCliAdapter, GitError};
pub use process::pid_alive;
pub use terminal::{TerminalAdapter, TerminalError, TmuxAdapter};

#[cfg(any(test, feature = "test-support"))]
pub use git::{FakeGitAdapter, GitCall};
#[cfg(any(test, feature = "test-support"))]
pub use terminal::{FakeTerminalAdapter, TerminalCall};
