//! CLI command implementations

pub mod place;
pub mod sanitize;

pub use place::PlaceCommand;
pub use sanitize::SanitizeCommand;
