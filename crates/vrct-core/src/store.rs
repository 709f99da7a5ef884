//! Layer store: metadata records and anonymous content blobs
//!
//! The staging root mirrors the real filesystem. For a real path
//! `/etc/app.json`, the metadata record lives at
//! `<fs_root>/etc/app.json.prototype.json` and that record's layer blobs
//! sit beside it under generated names, so one directory listing shows
//! everything tracked below a real directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use vrct_fs::path as fspath;

use crate::error::{Error, Result};

/// Suffix distinguishing metadata records from layer blobs
pub const RECORD_SUFFIX: &str = ".prototype.json";

/// Extension for layer content blobs
pub const CONTENT_EXT: &str = "layer";

/// Extension for layer options blobs
pub const OPTIONS_EXT: &str = "options";

/// Map a real path to its metadata record path under the staging root.
pub fn record_path(fs_root: &Path, real_path: &Path) -> PathBuf {
    let mirrored = fspath::rebase(real_path, fs_root);
    let name = mirrored
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    mirrored.with_file_name(format!("{name}{RECORD_SUFFIX}"))
}

/// Map a metadata record path back to the real path it tracks.
///
/// Inverse of [`record_path`]: strips the staging root prefix and the
/// record suffix, anchoring the result at the filesystem root.
pub fn real_path(fs_root: &Path, record: &Path) -> Result<PathBuf> {
    let relative = record
        .strip_prefix(fs_root)
        .map_err(|_| Error::record(record, "record lies outside the staging root"))?;
    let name = relative
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(RECORD_SUFFIX))
        .ok_or_else(|| Error::record(record, "record name lacks the expected suffix"))?;
    Ok(Path::new("/").join(relative.with_file_name(name)))
}

/// Write a blob under a generated collision-free name in `dir`.
///
/// Returns the bare file name to store as an opaque layer reference.
pub fn write_blob(dir: &Path, extension: &str, content: &[u8]) -> Result<String> {
    std::fs::create_dir_all(dir).map_err(|e| vrct_fs::Error::io(dir, e))?;
    loop {
        let name = format!("{}.{extension}", Uuid::new_v4());
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(content)
                    .and_then(|()| file.sync_all())
                    .map_err(|e| vrct_fs::Error::io(&path, e))?;
                return Ok(name);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(vrct_fs::Error::io(&path, e).into()),
        }
    }
}

/// Read a blob back by the reference produced by [`write_blob`].
pub fn read_blob(dir: &Path, reference: &str) -> Result<Vec<u8>> {
    Ok(vrct_fs::io::read(&dir.join(reference))?)
}

/// Decode a layer's options bytes into a generic key map.
///
/// Accepts JSON first, then YAML, mirroring what rule scripts actually
/// send. Absent options default to an empty map.
pub fn parse_options(options: Option<&[u8]>) -> std::result::Result<Value, String> {
    let Some(bytes) = options else {
        return Ok(Value::Object(serde_json::Map::new()));
    };
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        if value.is_object() {
            return Ok(value);
        }
        return Err("options must be a key map".to_string());
    }
    // Not JSON; the content codec handles the YAML reading
    match vrct_content::decode(bytes, vrct_content::Format::Yaml) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err("options must be a key map".to_string()),
        Err(_) => Err("options are neither valid JSON nor YAML".to_string()),
    }
}
