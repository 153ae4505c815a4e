//! Property tests for ignore pattern matching.

use std::path::Path;

use proptest::prelude::*;

use ferry::domain::value_objects::IgnoreFilter;

fn relative_path() -> impl Strategy<Value = String> {
    let segment = proptest::string::string_regex("[A-Za-z0-9._-]{1,16}").unwrap();
    proptest::collection::vec(segment, 1..=5).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: an empty filter never matches anything.
    #[test]
    fn property_empty_filter_matches_nothing(
        path in "(?s).{0,128}",
        is_dir in any::<bool>()
    ) {
        prop_assert!(!IgnoreFilter::empty().matches(Path::new(&path), is_dir));
    }

    /// PROPERTY: a basename pattern matches that name at any depth.
    #[test]
    fn property_extension_pattern_matches_at_any_depth(
        dir in relative_path(),
        stem in "[a-z]{1,8}"
    ) {
        let filter = IgnoreFilter::from_list("*.log").unwrap();
        let file = format!("{dir}/{stem}.log");
        prop_assert!(filter.matches(Path::new(&file), false));

        let other = format!("{dir}/{stem}.txt");
        // the directory part is random and may itself end in ".log"
        if !dir.split('/').any(|s| s.ends_with(".log")) {
            prop_assert!(!filter.matches(Path::new(&other), false));
        }
    }

    /// PROPERTY: matching never panics, whatever the path looks like.
    #[test]
    fn property_matching_never_panics(
        path in "(?s).{0,128}",
        is_dir in any::<bool>()
    ) {
        let filter = IgnoreFilter::from_list("*.map, node_modules, build/**, {a,b}.tmp").unwrap();
        let _ = filter.matches(Path::new(&path), is_dir);
    }
}
