//! End-to-end flow: layer a mixed tree, apply it, tear the session down,
//! and revert from a fresh session against the shared journal store.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use vrct_content::content_equal;
use vrct_core::{Format, VirtualFsSession};
use vrct_fs::checksum;

/// Lay out a small pre-existing "machine state" to mutate.
fn setup_targets() -> TempDir {
    let targets = TempDir::new().unwrap();
    fs::write(
        targets.path().join("app.json"),
        r#"{"port": 1, "user_setting": "keep"}"#,
    )
    .unwrap();
    fs::write(targets.path().join("motd.txt"), "welcome\n").unwrap();
    targets
}

#[test]
fn full_apply_and_cross_session_revert_cycle() {
    let base = TempDir::new().unwrap();
    let runtime_base = base.path().join("runtime");
    let targets = setup_targets();

    let app_json = targets.path().join("app.json");
    let motd = targets.path().join("motd.txt");
    let fresh = targets.path().join("new_dir/generated.conf");

    let app_checksum_before = checksum::compute_file_checksum(&app_json).unwrap();
    let original_motd = fs::read(&motd).unwrap();

    // One session stands in for one rule-checking run
    let mut session = VirtualFsSession::with_base(&runtime_base).unwrap();

    session
        .create_config(
            &app_json,
            br#"{"port": 9}"#,
            Some(br#"{"workers": 4}"#),
            false,
            Format::Json,
        )
        .unwrap();
    session
        .create_file(&motd, b"managed by vrct\n", false)
        .unwrap();
    session.create_file(&fresh, b"generated = true\n", false).unwrap();

    // The overlay already shows the future state without touching disk
    let names: Vec<String> = session
        .read_dir(targets.path())
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["app.json", "motd.txt", "new_dir"]);
    assert_eq!(fs::read(&motd).unwrap(), original_motd);
    let promised = session.read_file(&app_json).unwrap();

    let id = session
        .apply(&["port-rule".to_string(), "motd-rule".to_string()], true)
        .unwrap()
        .unwrap();

    let applied_bytes = fs::read(&app_json).unwrap();
    let applied: serde_json::Value = serde_json::from_slice(&applied_bytes).unwrap();
    assert_eq!(
        applied,
        json!({"port": 9, "user_setting": "keep", "workers": 4})
    );
    // What the overlay promised before the apply is what landed
    assert!(content_equal(&promised, &applied_bytes, Format::Json).unwrap());
    assert_eq!(fs::read(&motd).unwrap(), b"managed by vrct\n");
    assert_eq!(fs::read(&fresh).unwrap(), b"generated = true\n");

    // The run is over; its staging state goes away, the journal stays
    session.delete_runtime_temp().unwrap();

    // A later run reverts the recorded transaction by id alone
    let revert_session = VirtualFsSession::with_base(&runtime_base).unwrap();
    let mut reverted_rules = Vec::new();
    revert_session
        .revert(id, |rule| {
            reverted_rules.push(rule.to_string());
            Ok(())
        })
        .unwrap();

    assert_eq!(reverted_rules, ["port-rule", "motd-rule"]);
    assert_eq!(
        checksum::compute_file_checksum(&app_json).unwrap(),
        app_checksum_before
    );
    assert_eq!(fs::read(&motd).unwrap(), original_motd);
    assert!(!targets.path().join("new_dir").exists());
}

#[test]
fn copied_trees_apply_like_any_other_layers() {
    let base = TempDir::new().unwrap();
    let targets = TempDir::new().unwrap();
    let mut session = VirtualFsSession::with_base(base.path().join("runtime")).unwrap();

    let source = targets.path().join("skeleton");
    let destination = targets.path().join("deployed");
    fs::create_dir_all(source.join("conf.d")).unwrap();
    fs::write(source.join("main.conf"), "root = true\n").unwrap();
    fs::write(source.join("conf.d/extra.conf"), "extra = 1\n").unwrap();

    session.copy(&source, &destination).unwrap();
    assert!(!destination.exists());

    session.apply(&[], false).unwrap();

    assert_eq!(
        fs::read(&destination.join("main.conf")).unwrap(),
        b"root = true\n"
    );
    assert_eq!(
        fs::read(&destination.join("conf.d/extra.conf")).unwrap(),
        b"extra = 1\n"
    );
}
