//! Integration tests for path normalization

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;

use vrct_fs::path;

#[test]
fn expand_tilde_resolves_home_prefix() {
    let Some(home) = dirs::home_dir() else {
        return;
    };

    assert_eq!(path::expand_tilde(Path::new("~")), home);
    assert_eq!(
        path::expand_tilde(Path::new("~/.config/app.toml")),
        home.join(".config/app.toml")
    );
}

#[test]
fn expand_tilde_leaves_other_paths_untouched() {
    assert_eq!(
        path::expand_tilde(Path::new("/etc/app.json")),
        PathBuf::from("/etc/app.json")
    );
    assert_eq!(
        path::expand_tilde(Path::new("relative/file")),
        PathBuf::from("relative/file")
    );
    // ~user expansion is not supported
    assert_eq!(
        path::expand_tilde(Path::new("~nobody/file")),
        PathBuf::from("~nobody/file")
    );
}

#[test]
fn to_absolute_keeps_absolute_paths() {
    assert_eq!(
        path::to_absolute(Path::new("/etc/app.json")).unwrap(),
        PathBuf::from("/etc/app.json")
    );
}

#[test]
fn to_absolute_anchors_relative_paths_at_cwd() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(
        path::to_absolute(Path::new("some/file.txt")).unwrap(),
        cwd.join("some/file.txt")
    );
}

#[test]
fn to_absolute_resolves_dot_segments() {
    assert_eq!(
        path::to_absolute(Path::new("/etc/./nested/../app.json")).unwrap(),
        PathBuf::from("/etc/app.json")
    );
}

#[test]
fn rebase_mirrors_structure_under_root() {
    assert_eq!(
        path::rebase(Path::new("/etc/nested/app.json"), Path::new("/run/vrct/fs")),
        PathBuf::from("/run/vrct/fs/etc/nested/app.json")
    );
}

#[test]
fn rebase_of_root_is_the_root_itself() {
    assert_eq!(
        path::rebase(Path::new("/"), Path::new("/run/vrct/fs")),
        PathBuf::from("/run/vrct/fs")
    );
}
