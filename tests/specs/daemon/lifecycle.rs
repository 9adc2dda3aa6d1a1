//! Daemon lifecycle: pid file contention, stale recovery, socket protocol.

use crate::prelude::*;
use mc_daemon::protocol_wire::send_request;
use mc_daemon::{lifecycle, Listener, PidFile, PidFileError, Request};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn cold_start_serves_ping_over_the_socket() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());

    let socket_path = ctx.paths.daemon_socket();
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    let _listener = tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let response = send_request(&socket_path, &Request::Ping).await.unwrap();
    assert!(response.success);
    assert_eq!(response.data, Some(serde_json::json!("pong")));
}

#[tokio::test]
async fn stop_replies_success_before_signalling_shutdown() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());

    let socket_path = ctx.paths.daemon_socket();
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    let _listener = tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let response = send_request(&socket_path, &Request::Stop).await.unwrap();
    assert!(response.success);

    // The shutdown notification fires after the response is written.
    tokio::time::timeout(std::time::Duration::from_secs(1), ctx.shutdown.notified())
        .await
        .expect("shutdown was not signalled");
}

#[tokio::test]
async fn stale_pid_file_is_recovered_and_contention_fails() {
    let dir = tempdir().unwrap();
    let config = lifecycle::Config {
        paths: mc_core::Paths::new(dir.path().join("mc")),
    };
    config.paths.ensure_directories().unwrap();

    // A dead daemon left its pid behind.
    std::fs::write(config.paths.daemon_pid(), "999999\n").unwrap();

    let startup = lifecycle::startup(&config).await.unwrap();
    let recorded = std::fs::read_to_string(config.paths.daemon_pid()).unwrap();
    assert_eq!(recorded.trim(), std::process::id().to_string());

    // A second daemon against the same root must fail with contention.
    let err = PidFile::claim(config.paths.daemon_pid()).unwrap_err();
    match err {
        PidFileError::AlreadyRunning { pid } => {
            assert_eq!(pid, std::process::id() as i32);
        }
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    lifecycle::shutdown(&startup.ctx, &startup.pid_file);
    assert!(!config.paths.daemon_pid().exists());
}

#[tokio::test]
async fn uptime_and_counts_appear_in_status() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());
    register_demo_repo(&ctx);

    let socket_path = ctx.paths.daemon_socket();
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    let _listener = tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let response = send_request(&socket_path, &Request::Status).await.unwrap();
    let data = response.data.unwrap();
    assert_eq!(data["repos"], 1);
    assert_eq!(data["agents"], 0);
}
