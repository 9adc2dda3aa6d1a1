//! Cold start: register one repo and one worker, observe the state file.

use crate::prelude::*;
use mc_daemon::protocol_wire::send_request;
use mc_daemon::{Listener, Request};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn register_one_repo_and_one_worker() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());

    let socket_path = ctx.paths.daemon_socket();
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    let _listener = tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let response = send_request(
        &socket_path,
        &Request::AddRepo {
            name: "demo".to_string(),
            url: "git@example.com:demo.git".to_string(),
            session: "mc-demo".to_string(),
            mq_enabled: false,
            mq_track_mode: None,
            provider: None,
        },
    )
    .await
    .unwrap();
    assert!(response.success, "{:?}", response.error);

    let worktree = ctx.paths.agent_worktree("demo", "w1");
    let response = send_request(
        &socket_path,
        &Request::AddAgent {
            repo: "demo".to_string(),
            agent: "w1".to_string(),
            role: "worker".to_string(),
            worktree_path: worktree.clone(),
            window: "w1".to_string(),
            session_id: "s1".to_string(),
            pid: None,
            task: Some("T".to_string()),
        },
    )
    .await
    .unwrap();
    assert!(response.success, "{:?}", response.error);

    let response = send_request(&socket_path, &Request::ListRepos).await.unwrap();
    assert_eq!(response.data, Some(serde_json::json!(["demo"])));

    let response = send_request(
        &socket_path,
        &Request::ListAgents {
            repo: "demo".to_string(),
        },
    )
    .await
    .unwrap();
    let agents = response.data.unwrap();
    let agents = agents.as_array().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0]["name"], "w1");
    assert_eq!(agents[0]["type"], "worker");
    assert_eq!(agents[0]["task"], "T");

    // The freshly written state file holds one repo and one agent.
    let state: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ctx.paths.state_file()).unwrap()).unwrap();
    assert!(state["repos"]["demo"]["agents"]["w1"].is_object());
    assert_eq!(
        state["repos"]["demo"]["agents"]["w1"]["worktree_path"],
        worktree.display().to_string()
    );
}

#[tokio::test]
async fn remove_agent_for_unknown_agent_fails_cleanly() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());
    register_demo_repo(&ctx);

    let socket_path = ctx.paths.daemon_socket();
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    let _listener = tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let response = send_request(
        &socket_path,
        &Request::RemoveAgent {
            repo: "demo".to_string(),
            agent: "ghost".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(!response.success);
    assert!(response.error.unwrap().contains("agent not found"));
}
