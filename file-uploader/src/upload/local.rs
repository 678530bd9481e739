//! Local filesystem collaborator

use super::traits::Filesystem;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// [`Filesystem`] backed by the local disk through `tokio::fs`
///
/// Relocation is a rename. When the staging area lives on another device the
/// content is copied and the source removed afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Creates a local filesystem collaborator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_directory(&self, path: &str) -> bool {
        fs::metadata(path)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
    }

    async fn create_directory_recursive(&self, path: &str) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn relocate(&self, source: &Path, destination: &str) -> io::Result<()> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    source = %source.display(),
                    destination,
                    "rename crosses devices, copying instead"
                );
                fs::copy(source, destination).await?;
                fs::remove_file(source).await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_string(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_exists_and_is_directory() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let file = temp.path().join("present.txt");
        std::fs::write(&file, b"data").unwrap();

        assert!(fs.exists(&path_string(&file)).await);
        assert!(!fs.is_directory(&path_string(&file)).await);
        assert!(fs.is_directory(&path_string(temp.path())).await);
        assert!(!fs.exists(&path_string(&temp.path().join("absent.txt"))).await);
        assert!(!fs.is_directory(&path_string(&temp.path().join("absent"))).await);
    }

    #[tokio::test]
    async fn test_create_directory_recursive() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let nested = temp.path().join("a").join("b").join("c");

        fs.create_directory_recursive(&format!("{}/", path_string(&nested)))
            .await
            .unwrap();
        assert!(nested.is_dir());

        // Already present is not an error
        fs.create_directory_recursive(&path_string(&nested))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_relocate_moves_content() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let source = temp.path().join("staged.tmp");
        std::fs::write(&source, b"Hello, World!").unwrap();
        let destination = temp.path().join("final.txt");

        fs.relocate(&source, &path_string(&destination))
            .await
            .unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"Hello, World!");
    }

    #[tokio::test]
    async fn test_relocate_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let result = fs
            .relocate(
                &temp.path().join("missing.tmp"),
                &path_string(&temp.path().join("final.txt")),
            )
            .await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
