//! Filename sanitising and unique-name candidates
//!
//! Sanitising reduces a client-supplied filename to ASCII letters, digits,
//! `.`, `-` and `_`:
//!
//! 1. every run of whitespace becomes a single `_`
//! 2. every other unsafe character is dropped
//! 3. every dot except the last one is dropped, so only the extension separator survives
//!
//! The transformation is idempotent.
//!
//! ```rust
//! use file_uploader::upload::sanitize_filename;
//!
//! assert_eq!(sanitize_filename("my... test_txt. file. 1..txt"), "my_test_txt_file_1.txt");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._\-]").expect("unsafe character pattern is valid"));

/// Makes a filename safe to place on disk
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my test txt file.txt"), "my_test_txt_file.txt");
/// assert_eq!(sanitize_filename(r#"my $&?test_txt.\@*" file 1.txt"#), "my_test_txt_file_1.txt");
/// assert_eq!(sanitize_filename("README"), "README");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let underscored = WHITESPACE_RUN.replace_all(name, "_");
    let safe = UNSAFE_CHARS.replace_all(&underscored, "");
    keep_last_dot(&safe)
}

// The regex crate has no lookahead, so the final dot is located by hand.
fn keep_last_dot(name: &str) -> String {
    let Some(last_dot) = name.rfind('.') else {
        return name.to_string();
    };
    name.char_indices()
        .filter(|&(index, c)| c != '.' || index == last_dot)
        .map(|(_, c)| c)
        .collect()
}

/// Splits a filename at its last dot into stem and extension
///
/// A name without a dot has no extension.
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::split_extension;
///
/// assert_eq!(split_extension("photo.jpg"), ("photo", Some("jpg")));
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
/// assert_eq!(split_extension("README"), ("README", None));
/// ```
#[must_use]
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (name, None),
    }
}

/// Renders the numbered candidate `stem_increment.extension`
///
/// # Examples
///
/// ```rust
/// use file_uploader::upload::candidate_name;
///
/// assert_eq!(candidate_name("test", Some("txt"), 1), "test_1.txt");
/// assert_eq!(candidate_name("README", None, 3), "README_3");
/// ```
#[must_use]
pub fn candidate_name(stem: &str, extension: Option<&str>, increment: u64) -> String {
    extension.map_or_else(
        || format!("{stem}_{increment}"),
        |extension| format!("{stem}_{increment}.{extension}"),
    )
}
