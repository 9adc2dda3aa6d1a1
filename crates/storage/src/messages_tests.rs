// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mc_core::MessageStatus;
use tempfile::tempdir;

fn store(dir: &Path) -> MessageStore {
    MessageStore::new(dir.join("messages"))
}

#[test]
fn send_creates_a_pending_message_file() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());

    let message = store.send("demo", "sup", "w1", "hi").unwrap();

    assert_eq!(message.status, MessageStatus::Pending);
    let path = dir.path().join("messages/demo/w1").join(&message.id);
    assert!(path.is_file());
}

#[test]
fn list_scans_only_the_recipient_directory() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    store.send("demo", "sup", "w1", "for w1").unwrap();
    store.send("demo", "sup", "w2", "for w2").unwrap();

    let inbox = store.list("demo", "w1").unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].body, "for w1");
}

#[test]
fn list_of_unknown_agent_is_empty() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    assert!(store.list("demo", "ghost").unwrap().is_empty());
}

#[test]
fn list_orders_by_timestamp() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let first = store.send("demo", "sup", "w1", "first").unwrap();
    let second = store.send("demo", "sup", "w1", "second").unwrap();

    let ids: Vec<String> = store
        .list("demo", "w1")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    // Same-instant sends fall back to id order; both must be present.
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[test]
fn unparseable_file_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    store.send("demo", "sup", "w1", "good").unwrap();
    std::fs::write(dir.path().join("messages/demo/w1/garbage"), "{oops").unwrap();

    let inbox = store.list("demo", "w1").unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].body, "good");
}

#[test]
fn unread_means_pending_or_delivered() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let a = store.send("demo", "sup", "w1", "a").unwrap();
    let b = store.send("demo", "sup", "w1", "b").unwrap();
    let c = store.send("demo", "sup", "w1", "c").unwrap();

    store
        .update_status("demo", "w1", &b.id, MessageStatus::Delivered)
        .unwrap();
    store
        .update_status("demo", "w1", &c.id, MessageStatus::Read)
        .unwrap();

    let unread: Vec<String> = store
        .list_unread("demo", "w1")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert!(unread.contains(&a.id));
    assert!(unread.contains(&b.id));
    assert!(!unread.contains(&c.id));
}

#[test]
fn update_status_of_unknown_message_fails() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let err = store
        .update_status("demo", "w1", "nope", MessageStatus::Delivered)
        .unwrap_err();
    assert!(matches!(err, MessageError::NotFound(_)));
}

#[test]
fn ack_stamps_once_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let message = store.send("demo", "sup", "w1", "hi").unwrap();

    let acked = store.ack("demo", "w1", &message.id).unwrap();
    assert_eq!(acked.status, MessageStatus::Acknowledged);
    let stamp = acked.acked_at.unwrap();

    let again = store.ack("demo", "w1", &message.id).unwrap();
    assert_eq!(again.acked_at, Some(stamp));
}

#[test]
fn delete_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let message = store.send("demo", "sup", "w1", "hi").unwrap();

    store.delete("demo", "w1", &message.id).unwrap();
    store.delete("demo", "w1", &message.id).unwrap();
    assert!(store.list("demo", "w1").unwrap().is_empty());
}

#[test]
fn delete_acked_purges_exactly_the_acknowledged_set() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let a = store.send("demo", "sup", "w1", "a").unwrap();
    let b = store.send("demo", "sup", "w1", "b").unwrap();
    let c = store.send("demo", "sup", "w1", "c").unwrap();

    store.ack("demo", "w1", &a.id).unwrap();
    store.ack("demo", "w1", &c.id).unwrap();

    assert_eq!(store.delete_acked("demo", "w1").unwrap(), 2);
    let remaining: Vec<String> = store
        .list("demo", "w1")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(remaining, vec![b.id]);
}

#[test]
fn cleanup_orphaned_removes_only_invalid_directories() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    store.send("demo", "sup", "w1", "keep").unwrap();
    store.send("demo", "sup", "gone", "orphan").unwrap();
    // A plain file in the repo message dir must be ignored.
    std::fs::write(dir.path().join("messages/demo/README"), "not a dir").unwrap();

    let valid: HashSet<String> = ["w1".to_string()].into();
    let removed = store.cleanup_orphaned("demo", &valid).unwrap();

    assert_eq!(removed, 1);
    assert!(dir.path().join("messages/demo/w1").is_dir());
    assert!(!dir.path().join("messages/demo/gone").exists());
    assert!(dir.path().join("messages/demo/README").is_file());
}

#[test]
fn cleanup_orphaned_with_missing_repo_dir_is_zero() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let valid: HashSet<String> = HashSet::new();
    assert_eq!(store.cleanup_orphaned("ghost", &valid).unwrap(), 0);
}
