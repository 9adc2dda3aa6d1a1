// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background loops.
//!
//! Each loop is a timer select over tick / wake trigger / cancellation.
//! Ticks never queue: a pass that overruns the period simply delays the
//! next tick. Per-repository errors are logged and swallowed — a fault in
//! one repository must not stop reconciliation of the others, and the
//! next tick is the retry policy.

pub mod health;
pub mod nudge;
pub mod reconciler;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use mc_adapters::{GitAdapter, TerminalAdapter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::env;
use crate::lifecycle::DaemonCtx;

/// Default period of every loop.
pub const DEFAULT_TICK: Duration = Duration::from_secs(120);

/// Bounded wait for loops to observe cancellation on shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub(crate) fn tick_period() -> Duration {
    env::tick_interval().unwrap_or(DEFAULT_TICK)
}

/// Launch the four periodic loops, all observing `cancel`.
pub fn spawn<T: TerminalAdapter, G: GitAdapter>(
    ctx: Arc<DaemonCtx<T, G>>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(reconciler::run(Arc::clone(&ctx), cancel.clone())),
        tokio::spawn(health::run(Arc::clone(&ctx), cancel.clone())),
        tokio::spawn(router::run(Arc::clone(&ctx), cancel.clone())),
        tokio::spawn(nudge::run(ctx, cancel)),
    ]
}

/// Join the loops, giving up after [`SHUTDOWN_GRACE`]. In-flight external
/// operations are not interrupted; the bound keeps shutdown time sane.
pub async fn join_with_timeout(handles: Vec<JoinHandle<()>>) {
    let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
    for handle in handles {
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("loop task failed: {e}"),
            Err(_) => {
                warn!("loop did not stop within the shutdown grace period");
                return;
            }
        }
    }
}

/// Build the shared tick timer: period from the environment, delayed
/// (never bursting) when a pass overruns.
pub(crate) fn ticker() -> tokio::time::Interval {
    let mut tick = tokio::time::interval(tick_period());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tick
}
