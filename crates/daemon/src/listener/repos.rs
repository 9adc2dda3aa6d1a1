// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository request handlers.

use mc_adapters::{GitAdapter, TerminalAdapter};
use mc_core::{MergeQueueConfig, RepoRecord, TrackMode};

use crate::env;
use crate::lifecycle::DaemonCtx;
use crate::protocol::{RepoConfigInfo, Response};

pub(crate) struct AddRepoParams {
    pub name: String,
    pub url: String,
    pub session: String,
    pub mq_enabled: bool,
    pub mq_track_mode: Option<TrackMode>,
    pub provider: Option<String>,
}

pub(crate) fn handle_add_repo<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    params: AddRepoParams,
) -> Response {
    for (value, what) in [
        (&params.name, "repository name"),
        (&params.url, "repository url"),
        (&params.session, "tmux session"),
    ] {
        if value.trim().is_empty() {
            return Response::error(format!("{what} must not be empty"));
        }
    }

    let mut record = RepoRecord::new(&params.url, &params.session);
    record.merge_queue_config = MergeQueueConfig {
        enabled: params.mq_enabled,
        track_mode: params.mq_track_mode.unwrap_or_default(),
    };
    record.provider = params.provider.or_else(env::provider);

    match ctx.store.add_repo(&params.name, record) {
        Ok(()) => Response::empty(),
        Err(e) => Response::error(e.to_string()),
    }
}

pub(crate) fn handle_get_repo_config<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    name: &str,
) -> Response {
    match ctx.store.get_repo(name) {
        Some(repo) => Response::ok(RepoConfigInfo {
            name: name.to_string(),
            enabled: repo.merge_queue_config.enabled,
            track_mode: repo.merge_queue_config.track_mode,
        }),
        None => Response::error(format!("repository not found: {name}")),
    }
}

pub(crate) fn handle_update_repo_config<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    name: &str,
    mq_enabled: bool,
    mq_track_mode: TrackMode,
) -> Response {
    let config = MergeQueueConfig {
        enabled: mq_enabled,
        track_mode: mq_track_mode,
    };
    match ctx.store.set_merge_queue_config(name, config) {
        Ok(()) => Response::empty(),
        Err(e) => Response::error(e.to_string()),
    }
}

pub(crate) fn handle_set_current_repo<T: TerminalAdapter, G: GitAdapter>(
    ctx: &DaemonCtx<T, G>,
    name: &str,
) -> Response {
    match ctx.store.set_current_repo(name) {
        Ok(()) => Response::empty(),
        Err(e) => Response::error(e.to_string()),
    }
}
