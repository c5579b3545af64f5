//! Error types for the pack crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("file or directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("directory packs are unsupported: {}", .0.display())]
    DirectoryUnsupported(PathBuf),

    #[error("empty file, probably corrupted: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("format not recognized: {}", .0.display())]
    UnrecognizedFormat(PathBuf),

    #[error("unsupported old pack format (pack_manifest.json)")]
    UnsupportedOldFormat,

    #[error("manifest.json not found in the archive")]
    ManifestNotFound,

    #[error("invalid manifest.json contents: {0}")]
    ManifestInvalid(String),

    #[error("invalid content id {id:?}: {source}")]
    InvalidContentId {
        id: String,
        #[source]
        source: addonsync_types::Error,
    },

    #[error("unsupported script module language: {0}")]
    UnsupportedScriptLanguage(String),

    #[error("invalid script module entry path: {0}")]
    InvalidScriptEntry(String),

    #[error("malformed entity definition in '{path}': {reason}")]
    MalformedEntity { path: String, reason: String },

    #[error("invalid chunk request (start {start}, length {length}) for pack of {size} bytes")]
    InvalidChunk { start: u64, length: usize, size: u64 },
}
