//! Validation and placement of a single upload
//!
//! [`UploadPipeline::upload`] runs these steps and stops at the first failure:
//!
//! 1. sanitise the original filename
//! 2. uniquify it when the policy asks for unique names
//! 3. check, in order: overwrite permission, target directory, size,
//!    allow-list, block-list
//! 4. create the target directory if it is missing and allowed, then move
//!    the content to its destination
//!
//! Nothing is moved unless every check passes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use file_uploader::upload::{IncomingFile, LocalFilesystem, UploadPipeline, UploadPolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pipeline = UploadPipeline::new(LocalFilesystem::new());
//!
//! let mut policy = UploadPolicy::new("files");
//! policy.set_allowed_mime_types(["text/plain"]);
//!
//! let file = IncomingFile::new("my notes.txt", 10, "text/plain", "/tmp/upload-1234");
//! let placed = pipeline.upload(&file, &policy).await?;
//! assert_eq!(placed.path, "files/my_notes.txt");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::{debug, field, info_span, Instrument, Span};

use super::filename::{candidate_name, sanitize_filename, split_extension};
use super::locking::DirectoryLocks;
use super::policy::UploadPolicy;
use super::traits::Filesystem;
use super::types::{FileTypeRejection, IncomingFile, PlacedFile, UploadError, UploadResult};

/// Outcome of the checks: where the file goes and what placing it requires
#[derive(Debug)]
struct Placement {
    filename: String,
    destination: String,
    create_directory: bool,
}

/// Runs the placement pipeline against a [`Filesystem`]
///
/// The pipeline holds no per-upload state, so one instance can serve any
/// number of uploads. Concurrent uploads to the same destination race between
/// the checks and the move unless the pipeline is built
/// [`with_directory_locks`](UploadPipeline::with_directory_locks).
#[derive(Debug, Clone)]
pub struct UploadPipeline<F> {
    filesystem: F,
    locks: Option<Arc<DirectoryLocks>>,
}

impl<F: Filesystem> UploadPipeline<F> {
    /// Creates a pipeline delegating filesystem work to `filesystem`
    #[must_use]
    pub const fn new(filesystem: F) -> Self {
        Self {
            filesystem,
            locks: None,
        }
    }

    /// Serialises uploads per target directory using `locks`
    ///
    /// Share one `DirectoryLocks` between every pipeline writing to the same
    /// directories.
    #[must_use]
    pub fn with_directory_locks(mut self, locks: Arc<DirectoryLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Returns the filesystem collaborator
    pub const fn filesystem(&self) -> &F {
        &self.filesystem
    }

    /// Validates `file` against `policy` and moves it to its destination
    ///
    /// # Errors
    ///
    /// Returns the first failing check as an [`UploadError`], or
    /// `DirectoryCreationFailed` / `PhysicalMoveFailed` if the filesystem
    /// refuses the final steps
    pub async fn upload(&self, file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<PlacedFile> {
        self.upload_locked(file, policy)
            .instrument(upload_span(file, policy))
            .await
    }

    /// Runs every check without touching the filesystem
    ///
    /// Returns what [`upload`](UploadPipeline::upload) would place. The result
    /// is only a prediction: the filesystem may change before a real upload.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as an [`UploadError`]
    pub async fn prepare(&self, file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<PlacedFile> {
        self.prepare_locked(file, policy)
            .instrument(upload_span(file, policy))
            .await
    }

    async fn upload_locked(&self, file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<PlacedFile> {
        let _guard = self.lock_directory(policy).await;
        let placement = self.validate(file, policy).await?;
        self.place(file, policy, &placement).await?;
        debug!(destination = %placement.destination, "upload placed");
        Ok(placed_file(file, placement))
    }

    async fn prepare_locked(&self, file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<PlacedFile> {
        let _guard = self.lock_directory(policy).await;
        let placement = self.validate(file, policy).await?;
        Ok(placed_file(file, placement))
    }

    async fn lock_directory(&self, policy: &UploadPolicy) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(policy.target_directory()).await),
            None => None,
        }
    }

    async fn validate(&self, file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<Placement> {
        let sanitized = sanitize_filename(&file.original_name);
        // A name made only of dots would resolve to the directory itself
        if sanitized.trim_matches('.').is_empty() {
            return Err(UploadError::InvalidArgument(format!(
                "filename '{}' has no usable characters",
                file.original_name
            )));
        }
        debug!(sanitized = %sanitized, "filename sanitized");

        let filename = if policy.unique_filename_required() {
            let unique = self.unique_filename(policy.target_directory(), &sanitized).await?;
            debug!(unique = %unique, "filename uniquified");
            unique
        } else {
            sanitized
        };
        Span::current().record("filename", filename.as_str());

        let destination = format!("{}{filename}", policy.target_directory());
        self.check_overwrite_permission(policy, &destination).await?;
        let directory_missing = self.check_upload_directory(policy).await?;
        check_file_size(file, policy)?;
        check_file_type_is_allowed(file, policy)?;
        check_file_type_is_not_blocked(file, policy)?;

        Ok(Placement {
            filename,
            destination,
            create_directory: directory_missing,
        })
    }

    async fn place(&self, file: &IncomingFile, policy: &UploadPolicy, placement: &Placement) -> UploadResult<()> {
        if placement.create_directory {
            let directory = policy.target_directory();
            self.filesystem
                .create_directory_recursive(directory)
                .await
                .map_err(|source| UploadError::DirectoryCreationFailed {
                    path: directory.to_string(),
                    source,
                })?;
            debug!(directory, "target directory created");
        }

        self.filesystem
            .relocate(&file.content, &placement.destination)
            .await
            .map_err(|source| UploadError::PhysicalMoveFailed {
                destination: placement.destination.clone(),
                source,
            })
    }

    /// Probes the bare name first, then `stem_1.ext`, `stem_2.ext`, ...
    async fn unique_filename(&self, directory: &str, sanitized: &str) -> UploadResult<String> {
        if !self.filesystem.exists(&format!("{directory}{sanitized}")).await {
            return Ok(sanitized.to_string());
        }

        let (stem, extension) = split_extension(sanitized);
        for increment in 1..=u64::MAX {
            let candidate = candidate_name(stem, extension, increment);
            if !self.filesystem.exists(&format!("{directory}{candidate}")).await {
                return Ok(candidate);
            }
        }

        Err(UploadError::InvalidArgument(format!(
            "no free filename left for '{sanitized}'"
        )))
    }

    async fn check_overwrite_permission(&self, policy: &UploadPolicy, destination: &str) -> UploadResult<()> {
        if !policy.overwrite_allowed() && self.filesystem.exists(destination).await {
            return Err(UploadError::NoOverwritePermission {
                path: destination.to_string(),
            });
        }
        Ok(())
    }

    /// Returns whether the directory is missing and must be created
    async fn check_upload_directory(&self, policy: &UploadPolicy) -> UploadResult<bool> {
        let directory = policy.target_directory();
        if self.filesystem.is_directory(directory).await {
            return Ok(false);
        }
        if !policy.create_dirs_if_missing() {
            return Err(UploadError::DirectoryNotFound {
                path: directory.to_string(),
            });
        }
        Ok(true)
    }
}

fn upload_span(file: &IncomingFile, policy: &UploadPolicy) -> Span {
    info_span!(
        "upload",
        original_name = %file.original_name,
        target_directory = %policy.target_directory(),
        filename = field::Empty,
    )
}

fn placed_file(file: &IncomingFile, placement: Placement) -> PlacedFile {
    PlacedFile {
        path: placement.destination,
        filename: placement.filename,
        content_type: file.mime_type.clone(),
        size: file.size_bytes,
    }
}

fn check_file_size(file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<()> {
    if file.size_bytes > policy.max_file_size() {
        return Err(UploadError::FileTooLarge {
            actual: file.size_bytes,
            limit: policy.max_file_size(),
        });
    }
    Ok(())
}

/// An empty allow-list accepts every type that is not blocked
fn check_file_type_is_allowed(file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<()> {
    let allowed = policy.allowed_mime_types();
    if !allowed.is_empty() && !allowed.contains(&file.mime_type) {
        return Err(UploadError::InvalidFileType {
            mime_type: file.mime_type.clone(),
            reason: FileTypeRejection::NotAllowed,
        });
    }
    Ok(())
}

fn check_file_type_is_not_blocked(file: &IncomingFile, policy: &UploadPolicy) -> UploadResult<()> {
    if policy.blocked_mime_types().contains(&file.mime_type) {
        return Err(UploadError::InvalidFileType {
            mime_type: file.mime_type.clone(),
            reason: FileTypeRejection::Blocked,
        });
    }
    Ok(())
}
