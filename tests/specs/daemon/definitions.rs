//! Agent definition merging across the local and repo directories.

use mc_adapters::{load_definitions, DefinitionOrigin};
use tempfile::tempdir;

#[test]
fn local_base_is_preserved_and_repo_content_appended() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("local");
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&local).unwrap();
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::write(local.join("worker.md"), "# base").unwrap();
    std::fs::write(repo.join("worker.md"), "# override").unwrap();

    let defs = load_definitions(&local, &repo).unwrap();

    assert_eq!(defs.len(), 1);
    let worker = &defs[0];
    assert_eq!(worker.name, "worker");
    assert_eq!(worker.origin, DefinitionOrigin::Merged);

    let base_pos = worker.content.find("# base").unwrap();
    let sep_pos = worker.content.find("---").unwrap();
    let override_pos = worker.content.find("# override").unwrap();
    assert!(base_pos < sep_pos && sep_pos < override_pos);
}

#[test]
fn merging_twice_changes_nothing() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("local");
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&local).unwrap();
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::write(local.join("worker.md"), "# base").unwrap();
    std::fs::write(repo.join("worker.md"), "# override").unwrap();

    let first = load_definitions(&local, &repo).unwrap();

    // Re-merging the merged output against the same base is stable.
    std::fs::write(repo.join("worker.md"), &first[0].content).unwrap();
    let second = load_definitions(&local, &repo).unwrap();
    assert_eq!(first[0].content, second[0].content);
}
