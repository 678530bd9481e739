//! Filename sanitising command

use clap::Args;
use console::style;
use file_uploader::upload::sanitize_filename;

/// Print the sanitised form of each name
#[derive(Debug, Args)]
pub struct SanitizeCommand {
    /// Filenames to sanitise
    #[arg(required = true)]
    pub names: Vec<String>,
}

impl SanitizeCommand {
    /// Execute the command
    pub fn execute(&self) {
        for name in &self.names {
            let sanitized = sanitize_filename(name);
            if sanitized.trim_matches('.').is_empty() {
                println!("{} {}", style(name).dim(), style("(no usable characters)").red());
            } else {
                println!("{sanitized}");
            }
        }
    }
}
