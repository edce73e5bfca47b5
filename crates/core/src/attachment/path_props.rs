//! Property-based tests for PathGenerator.
//!
//! - Generated paths start with the base folder
//! - Obfuscation adds exactly `levels` single-character hex segments
//! - The wrapper folder is the last segment and a full token

use proptest::prelude::*;

use attache_shared::config::AttachmentsConfig;

use super::path::{PathGenerator, TOKEN_LEN};

/// Strategy to generate base folders, with stray slashes.
fn base_folder() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,8}",
        "/[a-z]{1,8}/",
        "[a-z]{1,8}/[a-z]{1,8}",
    ]
}

fn generator(base: &str, obfuscation: bool, levels: u32, wrapper: bool) -> PathGenerator {
    PathGenerator::new(
        &AttachmentsConfig::default()
            .with_base_folder(base)
            .with_path_obfuscation(obfuscation, levels)
            .with_wrapper_folder(wrapper),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every generated path lives under the trimmed base folder.
    #[test]
    fn prop_path_starts_with_base_folder(
        base in base_folder(),
        obfuscation in any::<bool>(),
        levels in 1u32..6,
        wrapper in any::<bool>(),
    ) {
        let path = generator(&base, obfuscation, levels, wrapper).candidate();
        let trimmed = base.trim_matches('/');

        prop_assert!(path.starts_with(trimmed));
        prop_assert!(!path.starts_with('/'));
        prop_assert!(!path.ends_with('/'));
        prop_assert!(!path.contains("//"));
    }

    /// Obfuscation inserts exactly `levels` single hex characters.
    #[test]
    fn prop_obfuscation_segment_count(levels in 1u32..8, wrapper in any::<bool>()) {
        let path = generator("", true, levels, wrapper).candidate();
        let segments: Vec<&str> = path.split('/').collect();
        let obfuscated = if wrapper { &segments[..segments.len() - 1] } else { &segments[..] };

        prop_assert_eq!(obfuscated.len(), levels as usize);
        for segment in obfuscated {
            prop_assert_eq!(segment.len(), 1);
            prop_assert!(segment.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    /// The wrapper folder is the full token and obfuscation segments come from it.
    #[test]
    fn prop_wrapper_folder_is_token(base in base_folder(), levels in 1u32..6) {
        let path = generator(&base, true, levels, true).candidate();
        let (prefix, token) = path.rsplit_once('/').unwrap_or(("", path.as_str()));

        prop_assert_eq!(token.len(), TOKEN_LEN);
        let obfuscated: Vec<&str> = prefix.rsplit('/').take(levels as usize).collect();
        for segment in obfuscated {
            prop_assert!(token.contains(segment));
        }
    }
}
