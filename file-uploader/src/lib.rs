//! file-uploader: policy-checked placement of uploaded files
//!
//! An uploaded file waits in a staging location until the application decides
//! where it belongs. This crate takes it from there: it sanitises the filename,
//! optionally makes it unique, checks it against an [`UploadPolicy`] (overwrite
//! permission, target directory, size, MIME allow-list and block-list) and
//! moves it into place.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use file_uploader::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let policy = PolicyBuilder::new("uploads")
//!         .try_max_file_size(5, "MB")?
//!         .allowed_mime_types(["image/jpeg", "image/png"])
//!         .create_dirs_if_missing(true)
//!         .unique_filename_required(true)
//!         .build()?;
//!
//!     let file = IncomingFile::from_path("/tmp/upload-1234", "image/png").await?;
//!     let placed = UploadPipeline::new(LocalFilesystem::new())
//!         .upload(&file, &policy)
//!         .await?;
//!
//!     println!("stored at {placed}");
//!     Ok(())
//! }
//! ```
//!
//! [`UploadPolicy`]: upload::UploadPolicy

pub mod config;
pub mod observability;
pub mod upload;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use file_uploader::prelude::*;
    //! ```

    pub use crate::config::{UploadSettings, UploaderConfig};
    pub use crate::upload::{
        sanitize_filename, DirectoryLocks, FileTypeRejection, Filesystem, IncomingFile,
        LocalFilesystem, PlacedFile, PolicyBuilder, UploadError, UploadPipeline, UploadPolicy,
        UploadResult,
    };
}
