//! Upload policy: the rules an upload is validated against
//!
//! A policy is built once by the caller and handed to the pipeline for each
//! upload. It can be assembled with fluent setters on an existing value or
//! with [`PolicyBuilder`].
//!
//! # Examples
//!
//! ```rust
//! use file_uploader::upload::{PolicyBuilder, UploadPolicy};
//!
//! let policy = PolicyBuilder::new("uploads")
//!     .try_max_file_size(5, "MB")?
//!     .allowed_mime_types(["image/jpeg", "image/png"])
//!     .create_dirs_if_missing(true)
//!     .build()?;
//!
//! assert_eq!(policy.target_directory(), "uploads/");
//! assert_eq!(policy.max_file_size(), 5_000_000);
//!
//! let mut policy = UploadPolicy::new("files");
//! policy
//!     .set_max_file_size(100, "KB")?
//!     .set_overwrite_allowed(true);
//! assert_eq!(policy.max_file_size(), 100_000);
//! # Ok::<(), file_uploader::upload::UploadError>(())
//! ```

use std::collections::BTreeSet;
use std::str::FromStr;

use super::types::{UploadError, UploadResult};

/// Default maximum file size in bytes
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

const SEPARATOR: char = '/';

/// Unit accepted when configuring the maximum file size
///
/// Multiples are decimal: a kilobyte is 1000 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// Plain bytes
    Bytes,
    /// 1000 bytes
    Kilobytes,
    /// 1,000,000 bytes
    Megabytes,
}

impl SizeUnit {
    /// Number of bytes in one unit
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1_000,
            Self::Megabytes => 1_000_000,
        }
    }

    /// Converts `size` units into bytes
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidArgument` if the result overflows `u64`
    pub fn to_bytes(self, size: u64) -> UploadResult<u64> {
        size.checked_mul(self.multiplier()).ok_or_else(|| {
            UploadError::InvalidArgument(format!("file size {size} {self:?} is too large"))
        })
    }
}

impl FromStr for SizeUnit {
    type Err = UploadError;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        match unit.trim().to_ascii_uppercase().as_str() {
            "B" | "BYTE" | "BYTES" => Ok(Self::Bytes),
            "KB" | "KILOBYTE" | "KILOBYTES" => Ok(Self::Kilobytes),
            "MB" | "MEGABYTE" | "MEGABYTES" => Ok(Self::Megabytes),
            _ => Err(UploadError::InvalidArgument(format!(
                "invalid file size unit '{unit}': expects 'B', 'KB' or 'MB'"
            ))),
        }
    }
}

/// Parses a size and unit given as text into a byte count
///
/// # Errors
///
/// Returns `UploadError::InvalidArgument` if the size is not a whole number,
/// the unit is not recognised, or the byte count is zero or overflows
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::parse_file_size;
///
/// assert_eq!(parse_file_size("100", "kb").unwrap(), 100_000);
/// assert!(parse_file_size("one", "B").is_err());
/// assert!(parse_file_size("1", "GB").is_err());
/// ```
pub fn parse_file_size(size: &str, unit: &str) -> UploadResult<u64> {
    let size: u64 = size.trim().parse().map_err(|_| {
        UploadError::InvalidArgument(format!("invalid file size '{size}': expects an integer"))
    })?;
    size_in_bytes(size, unit)
}

fn size_in_bytes(size: u64, unit: &str) -> UploadResult<u64> {
    let bytes = unit.parse::<SizeUnit>()?.to_bytes(size)?;
    if bytes == 0 {
        return Err(UploadError::InvalidArgument(
            "maximum file size must be greater than zero".to_string(),
        ));
    }
    Ok(bytes)
}

/// Normalises a directory so it ends with exactly one separator
fn normalize_directory(path: &str) -> String {
    let trimmed = path.trim_end_matches([SEPARATOR, std::path::MAIN_SEPARATOR]);
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push_str(trimmed);
    normalized.push(SEPARATOR);
    normalized
}

fn collect_types<I, S>(types: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    types.into_iter().map(Into::into).collect()
}

/// Rules applied to an upload before it is placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Destination directory, always separator-terminated
    target_directory: String,

    /// Maximum file size in bytes
    max_file_size: u64,

    /// Allowed MIME types (empty = no allow-list)
    allowed_mime_types: BTreeSet<String>,

    /// Blocked MIME types, checked after the allow-list
    blocked_mime_types: BTreeSet<String>,

    /// Replace an existing file at the destination
    overwrite_allowed: bool,

    /// Create the target directory when it is missing
    create_dirs_if_missing: bool,

    /// Suffix the filename until it no longer collides
    unique_filename_required: bool,

    /// Ceiling imposed by the environment on `max_file_size`
    upload_ceiling: Option<u64>,
}

impl UploadPolicy {
    /// Creates a policy with default rules for the given target directory
    ///
    /// # Examples
    ///
    /// ```rust
    /// use file_uploader::upload::UploadPolicy;
    ///
    /// let policy = UploadPolicy::new("files");
    /// assert_eq!(policy.target_directory(), "files/");
    /// assert_eq!(policy.max_file_size(), 1_000_000);
    /// assert!(!policy.overwrite_allowed());
    /// ```
    #[must_use]
    pub fn new(target_directory: impl AsRef<str>) -> Self {
        Self {
            target_directory: normalize_directory(target_directory.as_ref()),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: BTreeSet::new(),
            blocked_mime_types: BTreeSet::new(),
            overwrite_allowed: false,
            create_dirs_if_missing: false,
            unique_filename_required: false,
            upload_ceiling: None,
        }
    }

    /// Creates a new policy builder
    #[must_use]
    pub fn builder(target_directory: impl AsRef<str>) -> PolicyBuilder {
        PolicyBuilder::new(target_directory)
    }

    /// Policy for image uploads: 5MB, JPEG/PNG/GIF, directories created on demand
    ///
    /// # Examples
    ///
    /// ```rust
    /// use file_uploader::upload::UploadPolicy;
    ///
    /// let policy = UploadPolicy::images("images");
    /// assert!(policy.allowed_mime_types().contains("image/png"));
    /// assert!(policy.create_dirs_if_missing());
    /// ```
    #[must_use]
    pub fn images(target_directory: impl AsRef<str>) -> Self {
        let mut policy = Self::new(target_directory);
        policy.max_file_size = 5_000_000;
        policy
            .set_allowed_mime_types(["image/jpeg", "image/png", "image/gif"])
            .set_create_dirs_if_missing(true);
        policy
    }

    /// Policy for untrusted sources: small files, executables blocked, unique names
    #[must_use]
    pub fn restrictive(target_directory: impl AsRef<str>) -> Self {
        let mut policy = Self::new(target_directory);
        policy.max_file_size = 100_000;
        policy
            .set_blocked_mime_types([
                "application/x-msdownload",
                "application/x-executable",
                "application/x-sh",
            ])
            .set_unique_filename_required(true);
        policy
    }

    /// Sets the target directory, appending a trailing separator if needed
    ///
    /// An empty path becomes the bare separator.
    pub fn set_target_directory(&mut self, path: impl AsRef<str>) -> &mut Self {
        self.target_directory = normalize_directory(path.as_ref());
        self
    }

    /// Sets the maximum file size from a number and a unit (`B`, `KB` or `MB`)
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidArgument` if the unit is not recognised,
    /// the byte count is zero or overflows, or it exceeds the upload ceiling
    pub fn set_max_file_size(&mut self, size: u64, unit: &str) -> UploadResult<&mut Self> {
        let bytes = size_in_bytes(size, unit)?;
        self.apply_max_file_size(bytes)
    }

    /// Same as [`UploadPolicy::set_max_file_size`] with the size given as text
    ///
    /// # Errors
    ///
    /// Also fails when `size` is not a whole number
    pub fn set_max_file_size_str(&mut self, size: &str, unit: &str) -> UploadResult<&mut Self> {
        let bytes = parse_file_size(size, unit)?;
        self.apply_max_file_size(bytes)
    }

    fn apply_max_file_size(&mut self, bytes: u64) -> UploadResult<&mut Self> {
        if let Some(ceiling) = self.upload_ceiling {
            if bytes > ceiling {
                return Err(UploadError::InvalidArgument(format!(
                    "maximum file size {bytes} exceeds the upload ceiling of {ceiling} bytes"
                )));
            }
        }
        self.max_file_size = bytes;
        Ok(self)
    }

    /// Sets the ceiling later calls to `set_max_file_size` are checked against
    ///
    /// The value comes from the environment the policy runs in (for example
    /// a web server's request body limit). It does not alter the current maximum.
    pub const fn set_upload_ceiling(&mut self, ceiling: Option<u64>) -> &mut Self {
        self.upload_ceiling = ceiling;
        self
    }

    /// Replaces the allow-list
    pub fn set_allowed_mime_types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = collect_types(types);
        self
    }

    /// Replaces the block-list
    ///
    /// Blocking takes precedence: a type on both lists is rejected.
    pub fn set_blocked_mime_types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_mime_types = collect_types(types);
        self
    }

    /// Allows replacing an existing file with the same name
    pub const fn set_overwrite_allowed(&mut self, allowed: bool) -> &mut Self {
        self.overwrite_allowed = allowed;
        self
    }

    /// Allows creating the target directory when it does not exist
    pub const fn set_create_dirs_if_missing(&mut self, create: bool) -> &mut Self {
        self.create_dirs_if_missing = create;
        self
    }

    /// Requires a filename that does not collide with an existing file
    pub const fn set_unique_filename_required(&mut self, unique: bool) -> &mut Self {
        self.unique_filename_required = unique;
        self
    }

    /// Returns the separator-terminated target directory
    #[must_use]
    pub fn target_directory(&self) -> &str {
        &self.target_directory
    }

    /// Returns the maximum file size in bytes
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Returns the allow-list
    #[must_use]
    pub const fn allowed_mime_types(&self) -> &BTreeSet<String> {
        &self.allowed_mime_types
    }

    /// Returns the block-list
    #[must_use]
    pub const fn blocked_mime_types(&self) -> &BTreeSet<String> {
        &self.blocked_mime_types
    }

    /// Returns true if an existing file may be replaced
    #[must_use]
    pub const fn overwrite_allowed(&self) -> bool {
        self.overwrite_allowed
    }

    /// Returns true if a missing target directory will be created
    #[must_use]
    pub const fn create_dirs_if_missing(&self) -> bool {
        self.create_dirs_if_missing
    }

    /// Returns true if filenames are uniquified before placement
    #[must_use]
    pub const fn unique_filename_required(&self) -> bool {
        self.unique_filename_required
    }

    /// Returns the upload ceiling, if one is set
    #[must_use]
    pub const fn upload_ceiling(&self) -> Option<u64> {
        self.upload_ceiling
    }
}

/// Builder for creating upload policies
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::PolicyBuilder;
///
/// let policy = PolicyBuilder::new("files")
///     .max_file_size(10_000)
///     .blocked_mime_types(["application/x-msdownload"])
///     .overwrite_allowed(true)
///     .build()?;
///
/// assert!(policy.overwrite_allowed());
/// # Ok::<(), file_uploader::upload::UploadError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    policy: UploadPolicy,
}

impl PolicyBuilder {
    /// Creates a builder starting from the default rules
    #[must_use]
    pub fn new(target_directory: impl AsRef<str>) -> Self {
        Self {
            policy: UploadPolicy::new(target_directory),
        }
    }

    /// Sets the maximum file size in bytes
    ///
    /// Checked against zero and the upload ceiling by [`build`](PolicyBuilder::build).
    #[must_use]
    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.policy.max_file_size = bytes;
        self
    }

    /// Sets the maximum file size from a number and a unit
    ///
    /// # Errors
    ///
    /// Fails like [`UploadPolicy::set_max_file_size`]
    pub fn try_max_file_size(mut self, size: u64, unit: &str) -> UploadResult<Self> {
        self.policy.set_max_file_size(size, unit)?;
        Ok(self)
    }

    /// Sets the upload ceiling the maximum file size is checked against
    #[must_use]
    pub const fn upload_ceiling(mut self, ceiling: u64) -> Self {
        self.policy.upload_ceiling = Some(ceiling);
        self
    }

    /// Sets the allowed MIME types
    #[must_use]
    pub fn allowed_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.set_allowed_mime_types(types);
        self
    }

    /// Sets the blocked MIME types
    #[must_use]
    pub fn blocked_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.set_blocked_mime_types(types);
        self
    }

    /// Allows overwriting existing files
    #[must_use]
    pub const fn overwrite_allowed(mut self, allowed: bool) -> Self {
        self.policy.overwrite_allowed = allowed;
        self
    }

    /// Allows creating a missing target directory
    #[must_use]
    pub const fn create_dirs_if_missing(mut self, create: bool) -> Self {
        self.policy.create_dirs_if_missing = create;
        self
    }

    /// Requires unique filenames
    #[must_use]
    pub const fn unique_filename_required(mut self, unique: bool) -> Self {
        self.policy.unique_filename_required = unique;
        self
    }

    /// Builds the upload policy
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidArgument` if the maximum file size is zero
    /// or exceeds the upload ceiling
    pub fn build(self) -> UploadResult<UploadPolicy> {
        let mut policy = self.policy;
        if policy.max_file_size == 0 {
            return Err(UploadError::InvalidArgument(
                "maximum file size must be greater than zero".to_string(),
            ));
        }
        policy.apply_max_file_size(policy.max_file_size)?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = UploadPolicy::new("files/");
        assert_eq!(policy.max_file_size(), DEFAULT_MAX_FILE_SIZE);
        assert!(policy.allowed_mime_types().is_empty());
        assert!(policy.blocked_mime_types().is_empty());
        assert!(!policy.overwrite_allowed());
        assert!(!policy.create_dirs_if_missing());
        assert!(!policy.unique_filename_required());
        assert_eq!(policy.upload_ceiling(), None);
    }

    #[test]
    fn test_target_directory_normalization() {
        assert_eq!(UploadPolicy::new("files").target_directory(), "files/");
        assert_eq!(UploadPolicy::new("files/").target_directory(), "files/");
        assert_eq!(UploadPolicy::new("files//").target_directory(), "files/");
        assert_eq!(UploadPolicy::new("").target_directory(), "/");
        assert_eq!(UploadPolicy::new("/").target_directory(), "/");

        let mut policy = UploadPolicy::new("files");
        policy.set_target_directory("files/new");
        assert_eq!(policy.target_directory(), "files/new/");
        policy.set_target_directory("");
        assert_eq!(policy.target_directory(), "/");
    }

    #[test]
    fn test_valid_max_file_sizes() {
        let mut policy = UploadPolicy::new("files");
        policy.set_max_file_size(10_000, "B").unwrap();
        assert_eq!(policy.max_file_size(), 10_000);
        policy.set_max_file_size(100, "KB").unwrap();
        assert_eq!(policy.max_file_size(), 100_000);
        policy.set_max_file_size(1, "MB").unwrap();
        assert_eq!(policy.max_file_size(), 1_000_000);
    }

    #[test]
    fn test_unit_aliases_are_case_insensitive() {
        for unit in ["b", "Byte", "BYTES"] {
            assert_eq!(unit.parse::<SizeUnit>().unwrap(), SizeUnit::Bytes);
        }
        for unit in ["kb", "Kilobyte", "kilobytes"] {
            assert_eq!(unit.parse::<SizeUnit>().unwrap(), SizeUnit::Kilobytes);
        }
        for unit in ["mb", "MegaByte", "MEGABYTES"] {
            assert_eq!(unit.parse::<SizeUnit>().unwrap(), SizeUnit::Megabytes);
        }
    }

    #[test]
    fn test_invalid_unit() {
        let mut policy = UploadPolicy::new("files");
        let result = policy.set_max_file_size(1, "GB");
        assert!(matches!(result, Err(UploadError::InvalidArgument(_))));
        assert_eq!(policy.max_file_size(), DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_invalid_size() {
        let mut policy = UploadPolicy::new("files");
        assert!(matches!(
            policy.set_max_file_size_str("one", "B"),
            Err(UploadError::InvalidArgument(_))
        ));
        assert!(matches!(
            policy.set_max_file_size(0, "MB"),
            Err(UploadError::InvalidArgument(_))
        ));
        assert!(matches!(
            policy.set_max_file_size(u64::MAX, "KB"),
            Err(UploadError::InvalidArgument(_))
        ));

        policy.set_max_file_size_str(" 25 ", "kb").unwrap();
        assert_eq!(policy.max_file_size(), 25_000);
    }

    #[test]
    fn test_upload_ceiling() {
        let mut policy = UploadPolicy::new("files");
        policy.set_upload_ceiling(Some(2_000_000));
        policy.set_max_file_size(2, "MB").unwrap();
        assert_eq!(policy.max_file_size(), 2_000_000);

        let result = policy.set_max_file_size(3, "MB");
        assert!(matches!(result, Err(UploadError::InvalidArgument(_))));
        assert_eq!(policy.max_file_size(), 2_000_000);
    }

    #[test]
    fn test_mime_lists_are_replaced() {
        let mut policy = UploadPolicy::new("files");
        policy.set_allowed_mime_types(["image/jpg", "image/png"]);
        policy.set_allowed_mime_types(["text/plain"]);
        assert_eq!(policy.allowed_mime_types().len(), 1);
        assert!(policy.allowed_mime_types().contains("text/plain"));

        policy.set_blocked_mime_types(vec!["application/x-msdownload".to_string()]);
        assert!(policy.blocked_mime_types().contains("application/x-msdownload"));
    }

    #[test]
    fn test_fluent_setters_chain() {
        let mut policy = UploadPolicy::new("files");
        policy
            .set_overwrite_allowed(true)
            .set_create_dirs_if_missing(true)
            .set_unique_filename_required(true);
        assert!(policy.overwrite_allowed());
        assert!(policy.create_dirs_if_missing());
        assert!(policy.unique_filename_required());
    }

    #[test]
    fn test_policy_builder() {
        let policy = PolicyBuilder::new("files")
            .max_file_size(10)
            .unique_filename_required(true)
            .overwrite_allowed(true)
            .create_dirs_if_missing(true)
            .blocked_mime_types(["application/x-msdownload"])
            .build()
            .unwrap();

        assert_eq!(policy.max_file_size(), 10);
        assert!(policy.unique_filename_required());
        assert!(policy.overwrite_allowed());
        assert!(policy.create_dirs_if_missing());
        assert!(policy.blocked_mime_types().contains("application/x-msdownload"));
    }

    #[test]
    fn test_builder_respects_ceiling() {
        let result = PolicyBuilder::new("files")
            .upload_ceiling(500_000)
            .try_max_file_size(1, "MB");
        assert!(matches!(result, Err(UploadError::InvalidArgument(_))));
    }

    #[test]
    fn test_builder_rejects_zero_max() {
        let result = PolicyBuilder::new("files").max_file_size(0).build();
        assert!(matches!(result, Err(UploadError::InvalidArgument(_))));
    }

    #[test]
    fn test_builder_checks_ceiling_in_any_order() {
        let ceiling_first = PolicyBuilder::new("files")
            .upload_ceiling(10)
            .max_file_size(100)
            .build();
        assert!(matches!(ceiling_first, Err(UploadError::InvalidArgument(_))));

        let max_first = PolicyBuilder::new("files")
            .max_file_size(100)
            .upload_ceiling(10)
            .build();
        assert!(matches!(max_first, Err(UploadError::InvalidArgument(_))));

        let policy = PolicyBuilder::new("files")
            .max_file_size(10)
            .upload_ceiling(10)
            .build()
            .unwrap();
        assert_eq!(policy.max_file_size(), 10);
        assert_eq!(policy.upload_ceiling(), Some(10));
    }

    #[test]
    fn test_image_preset() {
        let policy = UploadPolicy::images("images");
        assert_eq!(policy.target_directory(), "images/");
        assert_eq!(policy.max_file_size(), 5_000_000);
        assert_eq!(policy.allowed_mime_types().len(), 3);
        assert!(policy.create_dirs_if_missing());
    }

    #[test]
    fn test_restrictive_preset() {
        let policy = UploadPolicy::restrictive("incoming");
        assert!(policy.unique_filename_required());
        assert!(policy.blocked_mime_types().contains("application/x-msdownload"));
        assert!(policy.allowed_mime_types().is_empty());
    }
}
