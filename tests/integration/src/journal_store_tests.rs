//! The shared revert store across multiple sessions

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use vrct_core::VirtualFsSession;

#[test]
fn transaction_ids_stay_monotonic_across_sessions() {
    let base = TempDir::new().unwrap();
    let runtime_base = base.path().join("runtime");
    let targets = TempDir::new().unwrap();

    let mut first = VirtualFsSession::with_base(&runtime_base).unwrap();
    first
        .create_file(&targets.path().join("one.txt"), b"1", false)
        .unwrap();
    let id_one = first.apply(&["rule-one".to_string()], true).unwrap().unwrap();
    first.delete_runtime_temp().unwrap();

    let mut second = VirtualFsSession::with_base(&runtime_base).unwrap();
    second
        .create_file(&targets.path().join("two.txt"), b"2", false)
        .unwrap();
    let id_two = second
        .apply(&["rule-two".to_string()], true)
        .unwrap()
        .unwrap();

    assert_eq!(id_one, 1);
    assert_eq!(id_two, 2);

    // Either transaction loads from any session on the same base
    assert_eq!(second.transaction(id_one).unwrap().rules, ["rule-one"]);
    assert_eq!(second.transaction(id_two).unwrap().rules, ["rule-two"]);
}

#[test]
fn reverts_of_separate_transactions_are_independent() {
    let base = TempDir::new().unwrap();
    let runtime_base = base.path().join("runtime");
    let targets = TempDir::new().unwrap();

    let mut session = VirtualFsSession::with_base(&runtime_base).unwrap();
    let a = targets.path().join("a.txt");
    let b = targets.path().join("b.txt");

    session.create_file(&a, b"a", false).unwrap();
    let id_a = session.apply(&[], true).unwrap().unwrap();

    // A second session layers a different path
    let mut other = VirtualFsSession::with_base(&runtime_base).unwrap();
    other.create_file(&b, b"b", false).unwrap();
    let id_b = other.apply(&[], true).unwrap().unwrap();

    assert!(a.exists());
    assert!(b.exists());

    session.revert(id_b, |_| Ok(())).unwrap();
    assert!(a.exists());
    assert!(!b.exists());

    other.revert(id_a, |_| Ok(())).unwrap();
    assert!(!a.exists());
}

#[test]
fn teardown_discards_unserialized_backups_but_keeps_the_store() {
    let base = TempDir::new().unwrap();
    let runtime_base = base.path().join("runtime");
    let targets = TempDir::new().unwrap();
    let path = targets.path().join("kept.txt");
    fs::write(&path, "original").unwrap();

    let mut recorded = VirtualFsSession::with_base(&runtime_base).unwrap();
    recorded.create_file(&path, b"recorded", false).unwrap();
    let id = recorded.apply(&[], true).unwrap().unwrap();
    recorded.delete_runtime_temp().unwrap();

    // An apply without a journal leaves nothing behind either
    let mut silent = VirtualFsSession::with_base(&runtime_base).unwrap();
    silent.create_file(&path, b"silent", false).unwrap();
    silent.apply(&[], false).unwrap();
    silent.delete_runtime_temp().unwrap();

    // The serialized transaction still replays after both teardowns
    let fresh = VirtualFsSession::with_base(&runtime_base).unwrap();
    fresh.revert(id, |_| Ok(())).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"original");
}
