//! File load and save

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::document::Document;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No file name")]
    NoPath,
}

/// Read a UTF-8 file into a document. A missing file is an empty document.
pub fn load(path: &Path) -> Result<Document, FileError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Document::from_text(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Document::new()),
        Err(source) => Err(FileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load `path`, falling back to an empty document when it cannot be read.
/// The caller keeps the path so a later `:w` still targets it.
pub fn load_or_empty(path: &Path) -> Document {
    match load(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("{}; starting with an empty buffer", e);
            Document::new()
        }
    }
}

/// Write the document's lines joined by line feeds
pub fn save(path: Option<&Path>, doc: &Document) -> Result<(), FileError> {
    let path = path.ok_or(FileError::NoPath)?;
    fs::write(path, doc.text()).map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })
}
