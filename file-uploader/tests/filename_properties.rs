//! Property tests for filename sanitising

use file_uploader::upload::{sanitize_filename, split_extension};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitize_is_idempotent(name in "\\PC{0,40}") {
        let once = sanitize_filename(&name);
        prop_assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn sanitized_names_use_safe_characters(name in "\\PC{0,40}") {
        let sanitized = sanitize_filename(&name);
        prop_assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
    }

    #[test]
    fn sanitized_names_keep_at_most_one_dot(name in "[a-z. ]{0,30}") {
        let sanitized = sanitize_filename(&name);
        prop_assert!(sanitized.matches('.').count() <= 1);
    }

    #[test]
    fn whitespace_never_survives(name in "[a-z \\t]{0,30}") {
        let sanitized = sanitize_filename(&name);
        prop_assert!(!sanitized.contains(char::is_whitespace));
        prop_assert!(!sanitized.contains("__"));
    }

    #[test]
    fn extension_survives_sanitising(stem in "[a-z]{1,10}", ext in "[a-z]{1,4}") {
        let sanitized = sanitize_filename(&format!("{stem}.{ext}"));
        prop_assert_eq!(split_extension(&sanitized), (stem.as_str(), Some(ext.as_str())));
    }
}
