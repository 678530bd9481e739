//! Configuration management for file-uploader
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `UPLOADER_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/file-uploader/{service}/config.toml` (user config, XDG)
//! 4. `/etc/file-uploader/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `UPLOADER_SECTION__FIELD_NAME`, for example
//! `UPLOADER_UPLOAD__MAX_FILE_SIZE=5`.
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [upload]
//! target_directory = "./uploads"
//! max_file_size = 5
//! max_file_size_unit = "MB"
//! allowed_mime_types = ["image/jpeg", "image/png", "image/gif"]
//! blocked_mime_types = []
//! overwrite = false
//! create_dirs = true
//! unique_filename = true
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use file_uploader::config::UploaderConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = UploaderConfig::load_for_service("avatars")?;
//! let policy = config.upload.to_policy()?;
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::upload::{UploadPolicy, UploadResult, DEFAULT_MAX_FILE_SIZE};

/// Upload policy settings as they appear in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Directory uploads are placed in
    pub target_directory: String,

    /// Maximum file size, in `max_file_size_unit`
    pub max_file_size: u64,

    /// Unit for `max_file_size`: `B`, `KB` or `MB`
    pub max_file_size_unit: String,

    /// Allowed MIME types (empty = all types not blocked)
    pub allowed_mime_types: Vec<String>,

    /// Blocked MIME types
    pub blocked_mime_types: Vec<String>,

    /// Replace existing files with the same name
    pub overwrite: bool,

    /// Create the target directory if it is missing
    pub create_dirs: bool,

    /// Suffix filenames until they are unique
    pub unique_filename: bool,

    /// Ceiling imposed by the environment on the maximum file size
    pub upload_ceiling_bytes: Option<u64>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            target_directory: "./uploads".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_file_size_unit: "B".to_string(),
            allowed_mime_types: Vec::new(),
            blocked_mime_types: Vec::new(),
            overwrite: false,
            create_dirs: false,
            unique_filename: false,
            upload_ceiling_bytes: None,
        }
    }
}

impl UploadSettings {
    /// Builds the upload policy these settings describe
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidArgument` if the size, unit or ceiling
    /// combination is invalid
    ///
    /// # Example
    ///
    /// ```rust
    /// use file_uploader::config::UploadSettings;
    ///
    /// let settings = UploadSettings {
    ///     max_file_size: 2,
    ///     max_file_size_unit: "MB".to_string(),
    ///     ..UploadSettings::default()
    /// };
    /// let policy = settings.to_policy()?;
    /// assert_eq!(policy.max_file_size(), 2_000_000);
    /// # Ok::<(), file_uploader::upload::UploadError>(())
    /// ```
    pub fn to_policy(&self) -> UploadResult<UploadPolicy> {
        let mut policy = UploadPolicy::new(&self.target_directory);
        policy
            .set_upload_ceiling(self.upload_ceiling_bytes)
            .set_max_file_size(self.max_file_size, &self.max_file_size_unit)?
            .set_allowed_mime_types(self.allowed_mime_types.iter().cloned())
            .set_blocked_mime_types(self.blocked_mime_types.iter().cloned())
            .set_overwrite_allowed(self.overwrite)
            .set_create_dirs_if_missing(self.create_dirs)
            .set_unique_filename_required(self.unique_filename);
        Ok(policy)
    }
}

/// Complete file-uploader configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Upload policy settings
    #[serde(default)]
    pub upload: UploadSettings,
}

impl UploaderConfig {
    /// Load configuration for a specific service
    ///
    /// Searches for configuration in XDG-compliant locations with precedence:
    /// 1. Environment variables (`UPLOADER_*`, use `__` for nesting)
    /// 2. `./config.toml`
    /// 3. `~/.config/file-uploader/{service_name}/config.toml`
    /// 4. `/etc/file-uploader/{service_name}/config.toml`
    /// 5. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - Configuration values fail type conversion
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config
        let system_config = PathBuf::from("/etc/file-uploader")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config
        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables (highest priority)
        figment = figment.merge(Env::prefixed("UPLOADER_").split("__").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file at `path` contains invalid TOML
    /// - Configuration values fail type conversion
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("UPLOADER_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// # Example
    ///
    /// ```rust
    /// use file_uploader::config::UploaderConfig;
    ///
    /// let path = UploaderConfig::recommended_path("avatars");
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("file-uploader")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
