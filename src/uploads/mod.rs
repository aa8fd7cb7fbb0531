//! Scratch storage for uploaded container files
//!
//! Every upload is written to its own directory keyed by a fresh upload id,
//! so concurrent uploads of the same filename never overwrite each other.
//! The store also remembers the most recent upload for clients that export
//! without naming one.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use uuid::Uuid;

/// A container file saved to scratch storage
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: Uuid,
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: usize,
}

impl UploadedFile {
    /// Whether the saved file is still on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[derive(Default)]
struct Registry {
    files: HashMap<Uuid, UploadedFile>,
    latest: Option<Uuid>,
}

pub struct UploadStore {
    root: PathBuf,
    registry: RwLock<Registry>,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Write an upload to `<root>/<upload id>/<filename>` and register it as
    /// the latest upload.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<UploadedFile, UploadError> {
        let filename = sanitize_filename(filename)
            .ok_or_else(|| UploadError::InvalidFilename(filename.to_string()))?;

        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        let file = UploadedFile {
            id,
            filename,
            path,
            size_bytes: bytes.len(),
        };

        {
            let mut registry = self.registry.write();
            registry.files.insert(id, file.clone());
            registry.latest = Some(id);
        }

        tracing::debug!(
            upload_id = %id,
            path = %file.path.display(),
            bytes = file.size_bytes,
            "Saved upload"
        );

        Ok(file)
    }

    pub fn get(&self, id: &Uuid) -> Option<UploadedFile> {
        self.registry.read().files.get(id).cloned()
    }

    pub fn latest(&self) -> Option<UploadedFile> {
        let registry = self.registry.read();
        registry
            .latest
            .and_then(|id| registry.files.get(&id))
            .cloned()
    }

    /// Look up an upload by id, or the latest one when no id is given.
    /// Uploads whose file has since disappeared from disk are not returned.
    pub fn resolve(&self, id: Option<&Uuid>) -> Option<UploadedFile> {
        let file = match id {
            Some(id) => self.get(id),
            None => self.latest(),
        }?;
        file.exists().then_some(file)
    }

    pub fn len(&self) -> usize {
        self.registry.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keep only the final path component of a client-supplied filename.
/// Both separators are stripped since browsers on Windows may send full paths.
fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
