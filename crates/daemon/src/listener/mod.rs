// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling each in its own task. One request, one response per
//! connection. Handlers draw on the internally synchronized state and
//! message stores, so they take no additional locks.

mod agents;
mod control;
mod repos;

use std::sync::Arc;

use mc_adapters::{GitAdapter, TerminalAdapter};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::lifecycle::DaemonCtx;
use crate::protocol::{Request, Response};
use crate::protocol_wire::{self, ProtocolError, DEFAULT_TIMEOUT};

/// Listener task for accepting socket connections.
pub struct Listener<T: TerminalAdapter, G: GitAdapter> {
    socket: UnixListener,
    ctx: Arc<DaemonCtx<T, G>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl<T: TerminalAdapter, G: GitAdapter> Listener<T, G> {
    pub fn new(socket: UnixListener, ctx: Arc<DaemonCtx<T, G>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop until the task is dropped, spawning a task
    /// per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
                                    debug!("Client disconnected")
                                }
                                ConnectionError::Protocol(ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<T: TerminalAdapter, G: GitAdapter>(
    stream: UnixStream,
    ctx: &DaemonCtx<T, G>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol_wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Log queries at debug level (frequent polling), mutations at info
    if is_query(&request) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    // Shutdown must be signalled only after the response is on the wire,
    // so the requester always sees its acknowledgement.
    let stop_requested = matches!(request, Request::Stop);

    let response = handle_request(request, ctx).await;

    protocol_wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    if stop_requested && response.success {
        ctx.shutdown.notify_one();
    }

    Ok(())
}

fn is_query(request: &Request) -> bool {
    matches!(
        request,
        Request::Ping
            | Request::Status
            | Request::ListRepos
            | Request::ListAgents { .. }
            | Request::GetRepoConfig { .. }
            | Request::GetCurrentRepo
    )
}

/// Handle a single request and return a response. Handlers never panic;
/// failures become error responses.
pub async fn handle_request<T: TerminalAdapter, G: GitAdapter>(
    request: Request,
    ctx: &DaemonCtx<T, G>,
) -> Response {
    match request {
        Request::Ping => Response::ok("pong"),

        Request::Status => control::handle_status(ctx),

        Request::Stop => Response::empty(),

        Request::ListRepos => Response::ok(ctx.store.list_repos()),

        Request::AddRepo {
            name,
            url,
            session,
            mq_enabled,
            mq_track_mode,
            provider,
        } => repos::handle_add_repo(
            ctx,
            repos::AddRepoParams {
                name,
                url,
                session,
                mq_enabled,
                mq_track_mode,
                provider,
            },
        ),

        Request::AddAgent {
            repo,
            agent,
            role,
            worktree_path,
            window,
            session_id,
            pid,
            task,
        } => agents::handle_add_agent(
            ctx,
            agents::AddAgentParams {
                repo,
                agent,
                role,
                worktree_path,
                window,
                session_id,
                pid,
                task,
            },
        ),

        Request::RemoveAgent { repo, agent } => agents::handle_remove_agent(ctx, &repo, &agent),

        Request::ListAgents { repo } => agents::handle_list_agents(ctx, &repo),

        Request::CompleteAgent { repo, agent } => {
            agents::handle_complete_agent(ctx, &repo, &agent)
        }

        Request::GetRepoConfig { name } => repos::handle_get_repo_config(ctx, &name),

        Request::UpdateRepoConfig {
            name,
            mq_enabled,
            mq_track_mode,
        } => repos::handle_update_repo_config(ctx, &name, mq_enabled, mq_track_mode),

        Request::SetCurrentRepo { name } => repos::handle_set_current_repo(ctx, &name),

        Request::GetCurrentRepo => Response::ok(ctx.store.current_repo()),

        Request::TriggerCleanup => {
            ctx.triggers.cleanup.notify_one();
            Response::empty()
        }

        Request::TriggerWorktreeRefresh => {
            ctx.triggers.reconcile.notify_one();
            Response::empty()
        }

        Request::RepairState => control::handle_repair(ctx).await,
    }
}

#[cfg(test)]
pub(crate) fn test_ctx(
    root: &std::path::Path,
) -> Arc<DaemonCtx<mc_adapters::FakeTerminalAdapter, mc_adapters::FakeGitAdapter>> {
    let paths = mc_core::Paths::new(root);
    paths.ensure_directories().unwrap();
    let store = mc_storage::StateStore::load(paths.state_file()).unwrap();
    Arc::new(DaemonCtx::new(
        paths,
        store,
        mc_adapters::FakeTerminalAdapter::new(),
        mc_adapters::FakeGitAdapter::new(),
    ))
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
