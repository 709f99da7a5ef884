//! Path normalization for mirroring real paths under a virtual root

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand a leading `~` into the user's home directory.
///
/// Only the bare `~` and `~/...` forms are expanded; `~user` is left alone,
/// as is everything when no home directory can be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if s == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Make a path absolute against the current working directory and resolve
/// `.` and `..` components lexically.
///
/// The path does not need to exist and symlinks are not followed.
pub fn to_absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| Error::io(path, e))?;
        cwd.join(path)
    };
    Ok(clean(&joined))
}

/// Rebase an absolute path under `root`, mirroring its directory structure.
///
/// Root and prefix components are dropped, so `/etc/app.json` rebased under
/// `/run/vrct/fs` becomes `/run/vrct/fs/etc/app.json`.
pub fn rebase(path: &Path, root: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    root.join(relative)
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_resolves_dot_segments() {
        assert_eq!(clean(Path::new("/etc/./app/../app.json")), PathBuf::from("/etc/app.json"));
    }

    #[test]
    fn clean_stops_parent_at_root() {
        assert_eq!(clean(Path::new("/../../etc")), PathBuf::from("/etc"));
    }
}
