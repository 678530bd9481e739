//! Upload placement command

use anyhow::{Context, Result};
use clap::Args;
use console::{style, Emoji};
use file_uploader::config::{UploadSettings, UploaderConfig};
use file_uploader::upload::{IncomingFile, LocalFilesystem, PlacedFile, UploadPipeline};
use std::path::{Path, PathBuf};

static SUCCESS: Emoji = Emoji("✓", "√");
static INFO: Emoji = Emoji("ℹ", "i");

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";
const SERVICE_NAME: &str = "cli";

/// Validate a file on disk and move it to the target directory
#[derive(Debug, Args)]
pub struct PlaceCommand {
    /// File to upload
    pub source: PathBuf,

    /// Filename to upload as (defaults to the source filename)
    #[arg(long)]
    pub name: Option<String>,

    /// MIME type (detected from content when omitted)
    #[arg(long)]
    pub mime: Option<String>,

    /// Directory to place the file in
    #[arg(long)]
    pub target_dir: Option<String>,

    /// Maximum file size, in `--unit`
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Unit for `--max-size` (B, KB, MB)
    #[arg(long, requires = "max_size")]
    pub unit: Option<String>,

    /// Allowed MIME type (repeatable)
    #[arg(long)]
    pub allow: Vec<String>,

    /// Blocked MIME type (repeatable)
    #[arg(long)]
    pub block: Vec<String>,

    /// Replace an existing file with the same name
    #[arg(long)]
    pub overwrite: bool,

    /// Create the target directory if it is missing
    #[arg(long)]
    pub create_dirs: bool,

    /// Suffix the filename until it is unique
    #[arg(long)]
    pub unique: bool,

    /// Configuration file (defaults to the standard search path)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run every check but leave the file where it is
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlaceCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded or describes an invalid policy
    /// - The source file cannot be inspected
    /// - The upload fails a policy check or cannot be moved
    pub async fn execute(&self) -> Result<()> {
        let config = match &self.config {
            Some(path) => UploaderConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => UploaderConfig::load_for_service(SERVICE_NAME)
                .context("Failed to load configuration")?,
        };
        let policy = self
            .apply_overrides(config.upload)
            .to_policy()
            .context("Invalid upload policy")?;

        let mime_type = match &self.mime {
            Some(mime) => mime.clone(),
            None => detect_mime_type(&self.source)?,
        };
        let mut file = IncomingFile::from_path(&self.source, mime_type)
            .await
            .with_context(|| format!("Failed to read {}", self.source.display()))?;
        if let Some(name) = &self.name {
            file.original_name.clone_from(name);
        }
        tracing::debug!(
            source = %self.source.display(),
            mime_type = %file.mime_type,
            size_bytes = file.size_bytes,
            "incoming file described"
        );

        let pipeline = UploadPipeline::new(LocalFilesystem::new());
        let placed = if self.dry_run {
            pipeline.prepare(&file, &policy).await?
        } else {
            pipeline.upload(&file, &policy).await?
        };

        self.report(&placed)
    }

    /// Layers command-line flags over the configured settings
    fn apply_overrides(&self, mut settings: UploadSettings) -> UploadSettings {
        if let Some(target_dir) = &self.target_dir {
            settings.target_directory.clone_from(target_dir);
        }
        if let Some(max_size) = self.max_size {
            settings.max_file_size = max_size;
            settings.max_file_size_unit = self.unit.clone().unwrap_or_else(|| "B".to_string());
        }
        if !self.allow.is_empty() {
            settings.allowed_mime_types.clone_from(&self.allow);
        }
        if !self.block.is_empty() {
            settings.blocked_mime_types.clone_from(&self.block);
        }
        settings.overwrite |= self.overwrite;
        settings.create_dirs |= self.create_dirs;
        settings.unique_filename |= self.unique;
        settings
    }

    fn report(&self, placed: &PlacedFile) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(placed)?);
            return Ok(());
        }

        if self.dry_run {
            println!(
                "{} {} would be placed at {}",
                INFO,
                style(&placed.filename).bold(),
                style(&placed.path).cyan()
            );
        } else {
            println!(
                "{} {} {}",
                style(SUCCESS).green(),
                style("Uploaded to").green().bold(),
                style(&placed.path).cyan()
            );
        }
        Ok(())
    }
}

/// Sniffs the MIME type from the file's magic bytes
fn detect_mime_type(path: &Path) -> Result<String> {
    let detected = infer::get_from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(detected.map_or_else(
        || FALLBACK_MIME_TYPE.to_string(),
        |kind| kind.mime_type().to_string(),
    ))
}
