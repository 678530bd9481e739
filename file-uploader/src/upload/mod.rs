//! Validation and placement of uploaded files
//!
//! An upload arrives as an [`IncomingFile`] sitting in a staging location.
//! The [`UploadPipeline`] checks it against an [`UploadPolicy`] and, if every
//! check passes, moves it into the policy's target directory through a
//! [`Filesystem`] collaborator.
//!
//! # Examples
//!
//! ```rust,no_run
//! use file_uploader::upload::{IncomingFile, LocalFilesystem, UploadPipeline, UploadPolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let policy = UploadPolicy::images("images");
//! let pipeline = UploadPipeline::new(LocalFilesystem::new());
//!
//! let file = IncomingFile::new("holiday photo.png", 48_213, "image/png", "/tmp/upload-1234");
//! let placed = pipeline.upload(&file, &policy).await?;
//! println!("Image uploaded to {placed}");
//! # Ok(())
//! # }
//! ```

mod filename;
mod local;
mod locking;
mod pipeline;
mod policy;
mod traits;
mod types;

pub use filename::{candidate_name, sanitize_filename, split_extension};
pub use local::LocalFilesystem;
pub use locking::DirectoryLocks;
pub use pipeline::UploadPipeline;
pub use policy::{parse_file_size, PolicyBuilder, SizeUnit, UploadPolicy, DEFAULT_MAX_FILE_SIZE};
pub use traits::Filesystem;
pub use types::{FileTypeRejection, IncomingFile, PlacedFile, UploadError, UploadResult};
