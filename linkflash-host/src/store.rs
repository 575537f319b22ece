//! Header persistence
//!
//! [`FileStore`] saves by writing a uniquely named sibling temporary file
//! and renaming it over the header, so an interrupted save never leaves a
//! truncated file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use linkflash_core::ConfigDocument;
use log::debug;
use tempfile::Builder;

/// Header read/write failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
}

/// Load and save the configuration header
pub trait ConfigStore: Send + Sync {
    /// Read the whole header
    fn load(&self) -> Result<ConfigDocument, StoreError>;

    /// Replace the header with `doc`
    fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError>;
}

/// Header on the local filesystem
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `doc` to a fresh temporary file next to the header, then
    /// rename it into place
    ///
    /// The temporary file is removed if any step fails.
    fn write_atomic(&self, doc: &ConfigDocument) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());

        let mut temp = Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(doc.as_str().as_bytes())?;
        temp.as_file().sync_all()?;

        // Keep the header's mode across the rename
        if let Ok(meta) = fs::metadata(&self.path) {
            temp.as_file().set_permissions(meta.permissions())?;
        }
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn load(&self) -> Result<ConfigDocument, StoreError> {
        let bytes = fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| StoreError::NotUtf8 {
            path: self.path.clone(),
        })?;
        debug!("loaded {} ({} bytes)", self.path.display(), text.len());
        Ok(ConfigDocument::new(text))
    }

    fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        self.write_atomic(doc).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("saved {} ({} bytes)", self.path.display(), doc.as_str().len());
        Ok(())
    }
}
