//! file-uploader CLI tool

#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{PlaceCommand, SanitizeCommand};
use file_uploader::observability;

#[derive(Debug, Parser)]
#[command(name = "file-uploader")]
#[command(version)]
#[command(about = "Validate uploaded files and move them into place", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check a file against the upload policy and move it to the target directory
    Place(PlaceCommand),
    /// Print the sanitised form of one or more filenames
    Sanitize(SanitizeCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_with_verbosity(observability::verbosity_level(cli.verbose))?;

    match cli.command {
        Commands::Place(cmd) => cmd.execute().await?,
        Commands::Sanitize(cmd) => cmd.execute(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sanitize() {
        let cli = Cli::try_parse_from(["file-uploader", "sanitize", "a b.txt", "c.d.txt"]).unwrap();
        match cli.command {
            Commands::Sanitize(cmd) => assert_eq!(cmd.names, vec!["a b.txt", "c.d.txt"]),
            Commands::Place(_) => panic!("expected sanitize"),
        }
    }

    #[test]
    fn test_verbose_is_counted_after_subcommand() {
        let cli = Cli::try_parse_from(["file-uploader", "sanitize", "-vv", "a.txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_sanitize_requires_a_name() {
        assert!(Cli::try_parse_from(["file-uploader", "sanitize"]).is_err());
    }

    #[test]
    fn test_parse_place() {
        let cli = Cli::try_parse_from([
            "file-uploader",
            "place",
            "/tmp/upload",
            "--target-dir",
            "files",
            "--max-size",
            "5",
            "--unit",
            "MB",
            "--allow",
            "image/png",
            "--allow",
            "image/jpeg",
            "--unique",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Place(cmd) = cli.command else {
            panic!("expected place");
        };
        assert_eq!(cmd.source.to_str(), Some("/tmp/upload"));
        assert_eq!(cmd.target_dir.as_deref(), Some("files"));
        assert_eq!(cmd.max_size, Some(5));
        assert_eq!(cmd.unit.as_deref(), Some("MB"));
        assert_eq!(cmd.allow, vec!["image/png", "image/jpeg"]);
        assert!(cmd.unique);
        assert!(cmd.dry_run);
        assert!(!cmd.overwrite);
        assert!(!cmd.json);
    }

    #[test]
    fn test_unit_requires_max_size() {
        assert!(Cli::try_parse_from(["file-uploader", "place", "/tmp/upload", "--unit", "KB"]).is_err());
    }
}
