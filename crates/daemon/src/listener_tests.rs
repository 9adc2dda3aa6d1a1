// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::AgentInfo;
use mc_core::TrackMode;
use tempfile::tempdir;

fn add_repo_request(name: &str) -> Request {
    Request::AddRepo {
        name: name.to_string(),
        url: format!("git@example.com:{name}.git"),
        session: format!("mc-{name}"),
        mq_enabled: false,
        mq_track_mode: None,
        provider: None,
    }
}

fn add_agent_request(ctx_root: &std::path::Path, repo: &str, agent: &str) -> Request {
    Request::AddAgent {
        repo: repo.to_string(),
        agent: agent.to_string(),
        role: "worker".to_string(),
        worktree_path: ctx_root.join("wts").join(repo).join(agent),
        window: agent.to_string(),
        session_id: format!("s-{agent}"),
        pid: None,
        task: Some("T".to_string()),
    }
}

#[tokio::test]
async fn ping_pongs() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());

    let response = handle_request(Request::Ping, &ctx).await;
    assert!(response.success);
    assert_eq!(response.data, Some(serde_json::json!("pong")));
}

#[tokio::test]
async fn add_repo_then_list_repos() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());

    let response = handle_request(add_repo_request("demo"), &ctx).await;
    assert!(response.success, "{:?}", response.error);

    let response = handle_request(Request::ListRepos, &ctx).await;
    assert_eq!(response.data, Some(serde_json::json!(["demo"])));
}

#[tokio::test]
async fn add_repo_rejects_empty_fields() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());

    let response = handle_request(
        Request::AddRepo {
            name: "".to_string(),
            url: "u".to_string(),
            session: "s".to_string(),
            mq_enabled: false,
            mq_track_mode: None,
            provider: None,
        },
        &ctx,
    )
    .await;
    assert!(!response.success);
    assert!(handle_request(Request::ListRepos, &ctx)
        .await
        .data
        .unwrap()
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn add_agent_then_list_agents() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let response =
        handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;
    assert!(response.success, "{:?}", response.error);

    let response = handle_request(
        Request::ListAgents {
            repo: "demo".to_string(),
        },
        &ctx,
    )
    .await;
    let agents: Vec<AgentInfo> = serde_json::from_value(response.data.unwrap()).unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].name, "w1");
    assert_eq!(agents[0].record.role, mc_core::AgentRole::Worker);
    assert_eq!(agents[0].record.task, "T");
}

#[tokio::test]
async fn add_agent_rejects_unknown_role() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let mut request = add_agent_request(ctx.paths.root(), "demo", "w1");
    if let Request::AddAgent { role, .. } = &mut request {
        *role = "janitor".to_string();
    }
    let response = handle_request(request, &ctx).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("unknown agent role"));
}

#[tokio::test]
async fn add_agent_rejects_worktree_outside_layout() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let mut request = add_agent_request(ctx.paths.root(), "demo", "w1");
    if let Request::AddAgent { worktree_path, .. } = &mut request {
        *worktree_path = "/tmp/elsewhere".into();
    }
    let response = handle_request(request, &ctx).await;
    assert!(!response.success);
}

#[tokio::test]
async fn add_agent_accepts_the_main_checkout() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let mut request = add_agent_request(ctx.paths.root(), "demo", "sup");
    if let Request::AddAgent { worktree_path, role, .. } = &mut request {
        *worktree_path = ctx.paths.repo_dir("demo");
        *role = "supervisor".to_string();
    }
    let response = handle_request(request, &ctx).await;
    assert!(response.success, "{:?}", response.error);
}

#[tokio::test]
async fn remove_agent_unknown_fails_without_mutation() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    let before = ctx.store.snapshot();

    let response = handle_request(
        Request::RemoveAgent {
            repo: "demo".to_string(),
            agent: "ghost".to_string(),
        },
        &ctx,
    )
    .await;

    assert!(!response.success);
    assert_eq!(ctx.store.snapshot(), before);
}

#[tokio::test]
async fn remove_agent_schedules_cleanup() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;

    let response = handle_request(
        Request::RemoveAgent {
            repo: "demo".to_string(),
            agent: "w1".to_string(),
        },
        &ctx,
    )
    .await;

    assert!(response.success);
    // The record stays until the health monitor tears resources down.
    let agent = ctx.store.get_agent("demo", "w1").unwrap();
    assert!(agent.ready_for_cleanup);
}

#[tokio::test]
async fn complete_agent_notifies_the_supervisor() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let mut sup = add_agent_request(ctx.paths.root(), "demo", "sup");
    if let Request::AddAgent { role, worktree_path, .. } = &mut sup {
        *role = "supervisor".to_string();
        *worktree_path = ctx.paths.repo_dir("demo");
    }
    handle_request(sup, &ctx).await;
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;

    let response = handle_request(
        Request::CompleteAgent {
            repo: "demo".to_string(),
            agent: "w1".to_string(),
        },
        &ctx,
    )
    .await;
    assert!(response.success, "{:?}", response.error);

    assert!(ctx.store.get_agent("demo", "w1").unwrap().ready_for_cleanup);
    let inbox = ctx.messages.list_unread("demo", "sup").unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].from, "w1");
    assert!(inbox[0].body.contains("w1"));
}

#[tokio::test]
async fn complete_agent_without_supervisor_still_succeeds() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;

    let response = handle_request(
        Request::CompleteAgent {
            repo: "demo".to_string(),
            agent: "w1".to_string(),
        },
        &ctx,
    )
    .await;
    assert!(response.success);
}

#[tokio::test]
async fn repo_config_round_trips() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let response = handle_request(
        Request::UpdateRepoConfig {
            name: "demo".to_string(),
            mq_enabled: true,
            mq_track_mode: TrackMode::Assigned,
        },
        &ctx,
    )
    .await;
    assert!(response.success);

    let response = handle_request(
        Request::GetRepoConfig {
            name: "demo".to_string(),
        },
        &ctx,
    )
    .await;
    let data = response.data.unwrap();
    assert_eq!(data["enabled"], true);
    assert_eq!(data["track_mode"], "assigned");
}

#[tokio::test]
async fn current_repo_selector_round_trips() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;

    let response = handle_request(Request::GetCurrentRepo, &ctx).await;
    assert_eq!(response.data, Some(serde_json::Value::Null));

    handle_request(
        Request::SetCurrentRepo {
            name: "demo".to_string(),
        },
        &ctx,
    )
    .await;
    let response = handle_request(Request::GetCurrentRepo, &ctx).await;
    assert_eq!(response.data, Some(serde_json::json!("demo")));
}

#[tokio::test]
async fn status_counts_agents_by_role() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    let mut sup = add_agent_request(ctx.paths.root(), "demo", "sup");
    if let Request::AddAgent { role, worktree_path, .. } = &mut sup {
        *role = "supervisor".to_string();
        *worktree_path = ctx.paths.repo_dir("demo");
    }
    handle_request(sup, &ctx).await;
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w2"), &ctx).await;

    let response = handle_request(Request::Status, &ctx).await;
    let data = response.data.unwrap();
    assert_eq!(data["repos"], 1);
    assert_eq!(data["agents"], 3);
    assert_eq!(data["agents_by_role"]["worker"], 2);
    assert_eq!(data["agents_by_role"]["supervisor"], 1);
}

#[tokio::test]
async fn repair_drops_repos_with_absent_sessions() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    handle_request(add_repo_request("gone"), &ctx).await;
    // Only demo's session exists in the fake terminal.
    ctx.terminal.add_session("mc-demo");

    let response = handle_request(Request::RepairState, &ctx).await;
    assert!(response.success);
    let report = response.data.unwrap();
    assert_eq!(report["repos_dropped"], serde_json::json!(["gone"]));
    assert_eq!(ctx.store.list_repos(), vec!["demo".to_string()]);
}

#[tokio::test]
async fn repair_is_idempotent_through_the_handler() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    handle_request(add_repo_request("demo"), &ctx).await;
    ctx.terminal.add_session("mc-demo");
    handle_request(add_agent_request(ctx.paths.root(), "demo", "w1"), &ctx).await;
    // w1's window never existed, so repair drops the agent.

    handle_request(Request::RepairState, &ctx).await;
    let snapshot = ctx.store.snapshot();
    let response = handle_request(Request::RepairState, &ctx).await;
    assert!(response.success);
    assert_eq!(ctx.store.snapshot(), snapshot);
    assert!(ctx.store.get_agent("demo", "w1").is_none());
}

#[tokio::test]
async fn stop_reports_success() {
    let dir = tempdir().unwrap();
    let ctx = test_ctx(dir.path());
    let response = handle_request(Request::Stop, &ctx).await;
    assert!(response.success);
}
