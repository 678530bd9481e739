//! Core types for upload placement

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Why a MIME type was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTypeRejection {
    /// An allow-list is configured and the type is not on it
    NotAllowed,
    /// The type is on the block-list
    Blocked,
}

impl fmt::Display for FileTypeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed => f.write_str("has not been allowed"),
            Self::Blocked => f.write_str("type has been blocked"),
        }
    }
}

/// Errors that can occur while configuring or running an upload
#[derive(Debug, Error)]
pub enum UploadError {
    /// Malformed configuration value (size, unit, filename)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A file already exists at the destination and overwriting is disabled
    #[error("File already exists at {path}: no permission to overwrite")]
    NoOverwritePermission {
        /// Destination that already exists
        path: String,
    },

    /// The target directory is missing and may not be created
    #[error("Upload directory not found: {path}")]
    DirectoryNotFound {
        /// Missing target directory
        path: String,
    },

    /// File size exceeds the configured maximum
    #[error("File size {actual} exceeds limit of {limit} bytes")]
    FileTooLarge {
        /// Size of the incoming file
        actual: u64,
        /// Maximum allowed size
        limit: u64,
    },

    /// MIME type refused by the allow-list or the block-list
    #[error("Invalid file type: {mime_type} {reason}")]
    InvalidFileType {
        /// Rejected MIME type
        mime_type: String,
        /// Which list rejected it
        reason: FileTypeRejection,
    },

    /// The filesystem refused to create the target directory
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        /// Directory that could not be created
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Every check passed but moving the content failed
    #[error("Failed to move upload to {destination}: {source}")]
    PhysicalMoveFailed {
        /// Intended destination
        destination: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Description of a file waiting in a staging location
///
/// Produced by whatever receives the upload (an HTTP handler, the CLI) and
/// never mutated by the pipeline.
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::IncomingFile;
///
/// let file = IncomingFile::new("report.pdf", 2048, "application/pdf", "/tmp/php1234");
/// assert_eq!(file.size_bytes, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Filename as supplied by the client
    pub original_name: String,

    /// Size of the content in bytes
    pub size_bytes: u64,

    /// Client-declared MIME type
    pub mime_type: String,

    /// Staging location of the content
    pub content: PathBuf,
}

impl IncomingFile {
    /// Creates a new incoming file description
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        content: impl Into<PathBuf>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    /// Describes a file already on disk, reading its name and size from metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected or is not a regular file
    pub async fn from_path(path: impl AsRef<Path>, mime_type: impl Into<String>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(original_name, metadata.len(), mime_type, path))
    }
}

/// A file that passed every check and was placed at its destination
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlacedFile {
    /// Destination path: target directory followed by the final filename
    pub path: String,

    /// Final filename after sanitising and uniquifying
    pub filename: String,

    /// MIME type the upload was accepted with
    pub content_type: String,

    /// Size in bytes
    pub size: u64,
}

impl fmt::Display for PlacedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_type_messages_distinguish_cause() {
        let not_allowed = UploadError::InvalidFileType {
            mime_type: "text/plain".to_string(),
            reason: FileTypeRejection::NotAllowed,
        };
        assert_eq!(
            not_allowed.to_string(),
            "Invalid file type: text/plain has not been allowed"
        );

        let blocked = UploadError::InvalidFileType {
            mime_type: "text/plain".to_string(),
            reason: FileTypeRejection::Blocked,
        };
        assert_eq!(
            blocked.to_string(),
            "Invalid file type: text/plain type has been blocked"
        );
    }

    #[test]
    fn test_placed_file_display_is_path() {
        let placed = PlacedFile {
            path: "files/test.txt".to_string(),
            filename: "test.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 10,
        };
        assert_eq!(format!("{placed}"), "files/test.txt");
    }

    #[test]
    fn test_placed_file_serializes() {
        let placed = PlacedFile {
            path: "files/test.txt".to_string(),
            filename: "test.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 10,
        };
        let json = serde_json::to_value(&placed).unwrap();
        assert_eq!(json["path"], "files/test.txt");
        assert_eq!(json["size"], 10);
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = IncomingFile::from_path(&path, "text/plain").await.unwrap();
        assert_eq!(file.original_name, "notes.txt");
        assert_eq!(file.size_bytes, 5);
        assert_eq!(file.content, path);
    }

    #[tokio::test]
    async fn test_from_path_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let result = IncomingFile::from_path(temp.path(), "text/plain").await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }
}
