//! Message lifecycle: pending → delivered → read → acknowledged → purged.

use crate::prelude::*;
use mc_adapters::TerminalCall;
use mc_core::{AgentRecord, AgentRole, MessageStatus};
use mc_daemon::loops::router;
use tempfile::tempdir;

fn register_worker(ctx: &TestDaemon, agent: &str) {
    ctx.store
        .add_agent(
            "demo",
            agent,
            AgentRecord::new(
                AgentRole::Worker,
                ctx.paths.agent_worktree("demo", agent),
                agent,
            ),
        )
        .unwrap();
    ctx.terminal.add_window("mc-demo", agent);
}

#[tokio::test]
async fn full_message_lifecycle() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());
    register_demo_repo(&ctx);
    register_worker(&ctx, "w1");

    // send → pending
    let message = ctx.messages.send("demo", "sup", "w1", "hi").unwrap();
    assert_eq!(message.status, MessageStatus::Pending);

    // A router pass pastes atomically and advances to delivered.
    router::run_pass(&ctx).await;
    assert_eq!(
        ctx.terminal.pastes(),
        vec![TerminalCall::SendTextThenSubmit {
            session: "mc-demo".to_string(),
            window: "w1".to_string(),
            text: "hi".to_string(),
        }]
    );
    assert_eq!(
        ctx.messages.get("demo", "w1", &message.id).unwrap().status,
        MessageStatus::Delivered
    );

    // Reader advances to read, then acknowledges.
    ctx.messages
        .update_status("demo", "w1", &message.id, MessageStatus::Read)
        .unwrap();
    let acked = ctx.messages.ack("demo", "w1", &message.id).unwrap();
    assert_eq!(acked.status, MessageStatus::Acknowledged);
    assert!(acked.acked_at.is_some());

    assert!(ctx.messages.list_unread("demo", "w1").unwrap().is_empty());
    assert_eq!(ctx.messages.delete_acked("demo", "w1").unwrap(), 1);
    assert!(ctx.messages.list("demo", "w1").unwrap().is_empty());
}

#[tokio::test]
async fn delivery_waits_for_the_window_to_exist() {
    let dir = tempdir().unwrap();
    let ctx = daemon_at(dir.path());
    register_demo_repo(&ctx);
    // Agent registered but its window is gone.
    ctx.store
        .add_agent(
            "demo",
            "w1",
            AgentRecord::new(
                AgentRole::Worker,
                ctx.paths.agent_worktree("demo", "w1"),
                "w1",
            ),
        )
        .unwrap();

    let message = ctx.messages.send("demo", "sup", "w1", "hi").unwrap();
    router::run_pass(&ctx).await;
    assert_eq!(
        ctx.messages.get("demo", "w1", &message.id).unwrap().status,
        MessageStatus::Pending
    );

    ctx.terminal.add_window("mc-demo", "w1");
    router::run_pass(&ctx).await;
    assert_eq!(
        ctx.messages.get("demo", "w1", &message.id).unwrap().status,
        MessageStatus::Delivered
    );
}
