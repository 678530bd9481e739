//! Filesystem collaborator used by the upload pipeline

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Filesystem operations the pipeline delegates to
///
/// Paths are the pipeline's destination strings: the separator-terminated
/// target directory, optionally followed by a filename. Implementations decide
/// how those map onto real storage; [`LocalFilesystem`](super::LocalFilesystem)
/// uses them as local paths.
///
/// # Examples
///
/// ```rust,no_run
/// use file_uploader::upload::{Filesystem, LocalFilesystem};
///
/// # async fn example() -> std::io::Result<()> {
/// let fs = LocalFilesystem::new();
/// if !fs.is_directory("uploads/").await {
///     fs.create_directory_recursive("uploads/").await?;
/// }
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Returns true if something exists at `path`
    async fn exists(&self, path: &str) -> bool;

    /// Returns true if `path` is an existing directory
    async fn is_directory(&self, path: &str) -> bool;

    /// Creates `path` and every missing parent
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if any segment cannot be created
    async fn create_directory_recursive(&self, path: &str) -> io::Result<()>;

    /// Moves the staged content at `source` to `destination`
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the content cannot be moved
    async fn relocate(&self, source: &Path, destination: &str) -> io::Result<()>;
}
