//! Logging initialisation
//!
//! The library emits `tracing` spans and events under the `file_uploader`
//! target; binaries call [`init`] or [`init_with_verbosity`] once to install
//! a subscriber.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Targets whose events are raised to the requested verbosity
const UPLOADER_TARGETS: [&str; 2] = ["file_uploader", "file_uploader_cli"];

/// Initialize the tracing subscriber with the build's default filter
///
/// Sets up:
/// - Pretty formatting in debug builds, JSON in release builds
/// - Environment-based log level filtering through `RUST_LOG`
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
///
/// # Example
///
/// ```rust,no_run
/// use file_uploader::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("uploader started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> anyhow::Result<()> {
    init_with_verbosity(None)
}

/// Initialize the tracing subscriber, raising uploader events to `level`
///
/// Other crates stay at `warn` so the pipeline's own spans are not buried
/// under dependency noise. `RUST_LOG` still wins when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_with_verbosity(level: Option<Level>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))?;

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

/// Builds the filter used when `RUST_LOG` is unset
fn filter_directives(level: Option<Level>) -> String {
    match level {
        Some(level) => {
            let level = level.as_str().to_ascii_lowercase();
            let mut directives = vec!["warn".to_string()];
            directives.extend(UPLOADER_TARGETS.iter().map(|target| format!("{target}={level}")));
            directives.join(",")
        }
        None if cfg!(debug_assertions) => "debug,file_uploader=trace".to_string(),
        None => "info".to_string(),
    }
}

/// Maps a `-v` count to the level uploader events are raised to
///
/// # Example
///
/// ```rust
/// use file_uploader::observability::verbosity_level;
/// use tracing::Level;
///
/// assert_eq!(verbosity_level(0), None);
/// assert_eq!(verbosity_level(2), Some(Level::DEBUG));
/// ```
#[must_use]
pub const fn verbosity_level(occurrences: u8) -> Option<Level> {
    match occurrences {
        0 => None,
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}
