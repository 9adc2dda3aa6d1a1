// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nudge loop.
//!
//! Prompts idle agents for a short status report. An agent is idle when
//! it is at least the idle threshold old, has not been nudged within the
//! threshold, and no message addressed to it was created within the
//! threshold. `last_nudge` advances only when the paste succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_core::AgentRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::env;
use crate::lifecycle::DaemonCtx;

/// Idle threshold: no nudge and no inbound message for this long.
pub fn idle_after() -> chrono::Duration {
    chrono::Duration::minutes(15)
}

/// The status request pasted into idle agent terminals.
pub const NUDGE_PROMPT: &str =
    "Status check: briefly report what you are working on and whether you are blocked.";

pub async fn run<T: TerminalAdapter, G: GitAdapter>(
    ctx: Arc<DaemonCtx<T, G>>,
    cancel: CancellationToken,
) {
    let mut tick = super::ticker();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {}
        }
        run_pass(&ctx).await;
    }
}

/// One nudge pass over every agent.
pub async fn run_pass<T: TerminalAdapter, G: GitAdapter>(ctx: &DaemonCtx<T, G>) {
    // There is no assistant process behind the windows in test mode.
    if env::test_mode() {
        return;
    }

    let now = Utc::now();
    let state = ctx.store.snapshot();
    for (repo_name, repo) in &state.repos {
        for (agent_name, agent) in &repo.agents {
            let last_inbound = match ctx.messages.list(repo_name, agent_name) {
                Ok(messages) => messages.iter().map(|m| m.timestamp).max(),
                Err(e) => {
                    warn!(repo = %repo_name, agent = %agent_name, "cannot scan inbox: {e}");
                    continue;
                }
            };
            if !is_idle(agent, last_inbound, now) {
                continue;
            }

            match ctx
                .terminal
                .send_text_then_submit(&repo.tmux_session, &agent.tmux_window, NUDGE_PROMPT)
                .await
            {
                Ok(()) => {
                    if let Err(e) = ctx.store.set_last_nudge(repo_name, agent_name, now) {
                        warn!(agent = %agent_name, "cannot record nudge: {e}");
                    }
                }
                Err(e) => {
                    debug!(repo = %repo_name, agent = %agent_name, "nudge paste failed: {e}");
                }
            }
        }
    }
}

/// The single idleness policy of the daemon.
pub fn is_idle(
    agent: &AgentRecord,
    last_inbound: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if agent.ready_for_cleanup {
        return false;
    }
    let threshold = idle_after();
    now - agent.created_at >= threshold
        && now - agent.last_nudge >= threshold
        && last_inbound.map_or(true, |t| now - t >= threshold)
}

#[cfg(test)]
#[path = "nudge_tests.rs"]
mod tests;
