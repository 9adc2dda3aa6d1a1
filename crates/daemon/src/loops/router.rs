// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message router.
//!
//! Delivers pending messages into recipient terminals. The paste and the
//! submit keystroke are one atomic terminal operation; only after it
//! succeeds is the message advanced to *delivered*. A failed paste leaves
//! the message pending for the next pass, trading duplicate-free visual
//! delivery for at-least-one-attempt retry, bounded by agent cleanup.
//! Delivered messages are never re-sent.

use std::sync::Arc;

use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_core::MessageStatus;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::lifecycle::DaemonCtx;

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

/// One delivery pass over every recipient agent.
pub async fn run_pass<T: TerminalAdapter, G: GitAdapter>(ctx: &DaemonCtx<T, G>) {
    let state = ctx.store.snapshot();
    for (repo_name, repo) in &state.repos {
        for (agent_name, agent) in &repo.agents {
            let unread = match ctx.messages.list_unread(repo_name, agent_name) {
                Ok(unread) => unread,
                Err(e) => {
                    warn!(repo = %repo_name, agent = %agent_name, "cannot scan inbox: {e}");
                    continue;
                }
            };

            for message in unread {
                if message.status != MessageStatus::Pending {
                    continue;
                }
                match ctx
                    .terminal
                    .send_text_then_submit(&repo.tmux_session, &agent.tmux_window, &message.body)
                    .await
                {
                    Ok(()) => {
                        if let Err(e) = ctx.messages.update_status(
                            repo_name,
                            agent_name,
                            &message.id,
                            MessageStatus::Delivered,
                        ) {
                            warn!(id = %message.id, "cannot advance message status: {e}");
                        }
                    }
                    Err(e) => {
                        // Window gone or terminal unavailable: leave the
                        // message pending and stop trying this recipient.
                        debug!(repo = %repo_name, agent = %agent_name, "paste failed, will retry: {e}");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
