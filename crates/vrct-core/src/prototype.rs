//! File prototypes: the layered virtual state of one real path
//!
//! A prototype never touches the real file it tracks except to read it.
//! All pending changes live as layers in the session staging tree until an
//! apply moves the merged result into place.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use vrct_content::{codec, merge, Format};
use vrct_fs::io;

use crate::error::{Error, Result};
use crate::store;

/// One contribution to a prototype's final content.
///
/// References are opaque blob names resolved against the record's
/// directory in the staging tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub content_ref: String,
    pub options_ref: String,
    /// Optional layers only fill keys no other layer supplied
    pub is_optional: bool,
}

/// Virtual record for exactly one real filesystem path.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilePrototype {
    pub format: Format,
    pub layers: Vec<Layer>,
    /// Did the real path exist before any virtual layer was added
    pub real_file_existed: bool,
    /// Whether the pre-existing real content was recorded as a layer, so
    /// merges never silently discard it
    pub original_content_captured: bool,
    #[serde(skip)]
    record_path: PathBuf,
    #[serde(skip)]
    real_path: PathBuf,
    #[serde(skip)]
    persisted: bool,
}

impl FilePrototype {
    /// Load the record tracking `real_path`, or make a fresh untracked one.
    ///
    /// Loading never writes; a fresh prototype only reaches disk once a
    /// layer is added or the commit engine persists it.
    pub fn load(fs_root: &Path, real_path: &Path) -> Result<Self> {
        let record_path = store::record_path(fs_root, real_path);
        if io::file_exists(&record_path)? {
            let bytes = io::read(&record_path)?;
            let mut prototype: Self =
                serde_json::from_slice(&bytes).map_err(|e| Error::record(&record_path, e))?;
            prototype.record_path = record_path;
            prototype.real_path = real_path.to_path_buf();
            prototype.persisted = true;
            Ok(prototype)
        } else {
            Ok(Self {
                format: Format::Text,
                layers: Vec::new(),
                real_file_existed: io::path_exists(real_path)?,
                original_content_captured: false,
                record_path,
                real_path: real_path.to_path_buf(),
                persisted: false,
            })
        }
    }

    /// The real filesystem path this prototype tracks.
    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    /// The metadata record path in the staging tree.
    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Whether a record for this path exists in the staging tree.
    pub fn is_tracked(&self) -> bool {
        self.persisted
    }

    /// Persist the metadata record.
    pub fn save(&mut self) -> Result<()> {
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| Error::record(&self.record_path, e))?;
        io::atomic_write(&self.record_path, &bytes)?;
        self.persisted = true;
        Ok(())
    }

    /// Store content and options as blobs and return the layer descriptor.
    ///
    /// Structured content is normalized through the codec before storage;
    /// content that does not decode in the declared format is rejected.
    /// The layer is not attached yet, see [`FilePrototype::add_layer`].
    pub fn create_layer(
        &self,
        content: &[u8],
        options: Option<&[u8]>,
        is_optional: bool,
    ) -> Result<Layer> {
        let dir = self.blob_dir()?.to_path_buf();

        let stored: Vec<u8> = if self.format.is_structured() {
            let tree = codec::decode(content, self.format)
                .map_err(|e| Error::unsupported_format(&self.real_path, e.to_string()))?;
            serde_json::to_vec(&tree).map_err(|e| Error::record(&self.record_path, e))?
        } else {
            content.to_vec()
        };

        let options_tree = store::parse_options(options)
            .map_err(|message| Error::unsupported_format(&self.real_path, message))?;
        let options_bytes =
            serde_json::to_vec(&options_tree).map_err(|e| Error::record(&self.record_path, e))?;

        let content_ref = store::write_blob(&dir, store::CONTENT_EXT, &stored)?;
        let options_ref = store::write_blob(&dir, store::OPTIONS_EXT, &options_bytes)?;

        Ok(Layer {
            content_ref,
            options_ref,
            is_optional,
        })
    }

    /// Append a layer, validate the merge still works, and persist.
    ///
    /// A failed merge rolls the append back, leaving the layer list as it
    /// was. `is_original_capture` marks the layer as holding the real
    /// file's pre-existing content; the flag never reverts to false once
    /// set, later ordinary layers do not un-capture the original.
    pub fn add_layer(&mut self, layer: Layer, is_original_capture: bool) -> Result<()> {
        self.layers.push(layer);
        if let Err(e) = self.simulate() {
            self.layers.pop();
            return Err(e);
        }
        if is_original_capture {
            self.original_content_captured = true;
        }
        self.save()?;
        debug!(
            path = %self.real_path.display(),
            layers = self.layers.len(),
            "added layer"
        );
        Ok(())
    }

    /// Record the real file's current content as the first layer, once.
    ///
    /// Only structured prototypes capture; a text prototype's layers
    /// replace the file wholesale anyway. No-op when layers already exist,
    /// when nothing was there to capture, or after a prior capture.
    pub fn capture_original(&mut self) -> Result<()> {
        if !self.format.is_structured()
            || !self.layers.is_empty()
            || self.original_content_captured
            || !self.real_file_existed
        {
            return Ok(());
        }
        if !io::file_exists(&self.real_path)? {
            return Ok(());
        }
        let original = io::read(&self.real_path)?;
        let layer = self.create_layer(&original, None, false)?;
        self.add_layer(layer, true)?;
        debug!(path = %self.real_path.display(), "captured original content");
        Ok(())
    }

    /// Compute the effective content of this prototype.
    ///
    /// Structured formats fold layers in insertion order: non-optional
    /// layers overwrite, optional layers and every layer's options map only
    /// fill missing keys. Text takes the most recent layer's bytes. With no
    /// layers at all the real file's bytes pass through untouched.
    pub fn simulate(&self) -> Result<Vec<u8>> {
        if self.format.is_structured() && !self.layers.is_empty() {
            self.simulate_structured()
        } else if let Some(last) = self.layers.last() {
            store::read_blob(self.blob_dir()?, &last.content_ref)
        } else {
            self.real_fallback()
        }
    }

    fn simulate_structured(&self) -> Result<Vec<u8>> {
        let dir = self.blob_dir()?;
        let mut accumulator = Value::Object(serde_json::Map::new());
        for layer in &self.layers {
            let content = self.load_tree(dir, &layer.content_ref)?;
            if layer.is_optional {
                merge::fill_missing(&mut accumulator, content);
            } else {
                merge::overlay(&mut accumulator, content);
            }
            // Options are fallback defaults regardless of layer kind
            let options = self.load_tree(dir, &layer.options_ref)?;
            merge::fill_missing(&mut accumulator, options);
        }
        Ok(codec::encode(&accumulator, self.format)?)
    }

    fn load_tree(&self, dir: &Path, reference: &str) -> Result<Value> {
        let bytes = store::read_blob(dir, reference)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::record(dir.join(reference), e))
    }

    fn real_fallback(&self) -> Result<Vec<u8>> {
        if io::file_exists(&self.real_path)? {
            return Ok(io::read(&self.real_path)?);
        }
        Err(Error::NoSource {
            path: self.real_path.clone(),
        })
    }

    fn blob_dir(&self) -> Result<&Path> {
        self.record_path
            .parent()
            .ok_or_else(|| Error::record(&self.record_path, "record has no parent directory"))
    }
}
