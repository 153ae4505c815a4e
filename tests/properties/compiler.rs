//! Property tests for action compilation.

use proptest::prelude::*;

use ferry::domain::services::REVISION_FILE;
use ferry::domain::value_objects::LocalScope;
use ferry::{compile, Verb};

fn file_name() -> impl Strategy<Value = String> {
    let segment = proptest::string::string_regex("[a-z0-9_-]{1,10}").unwrap();
    proptest::collection::vec(segment, 1..=3).prop_map(|segments| segments.join("/"))
}

fn status() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("added"),
        Just("modified"),
        Just("removed"),
        Just("unchanged"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: compiling arbitrary text never panics.
    #[test]
    fn property_compile_never_panics(raw in "(?s).{0,256}") {
        let _ = compile(&raw, "/site", &LocalScope::unrestricted());
    }

    /// PROPERTY: change-set entries keep their order and the revision write
    /// is always last.
    #[test]
    fn property_change_set_order_preserved(
        entries in proptest::collection::vec((file_name(), status()), 0..12),
        revision in "[0-9a-f]{7,40}"
    ) {
        let files: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, status)| serde_json::json!({ "filename": name, "status": status }))
            .collect();
        let raw = serde_json::json!({ "files": files, "sha": revision }).to_string();

        let batch = compile(&raw, "/site", &LocalScope::unrestricted()).unwrap();
        let ops = batch.operations();

        let expected: Vec<(Verb, String)> = entries
            .iter()
            .filter_map(|(name, status)| match *status {
                "removed" => Some((Verb::Delete, format!("/site/{name}"))),
                "unchanged" => None,
                _ => Some((Verb::Upload, format!("/site/{name}"))),
            })
            .collect();

        prop_assert_eq!(ops.len(), expected.len() + 1);
        for (op, (verb, file)) in ops.iter().zip(&expected) {
            prop_assert_eq!(op.verb, *verb);
            prop_assert_eq!(op.file(), file.as_str());
        }

        let last = &ops[ops.len() - 1];
        prop_assert_eq!(last.verb, Verb::Write);
        prop_assert_eq!(last.source.as_str(), revision.as_str());
        let revision_path = format!("/site/{}", REVISION_FILE);
        prop_assert_eq!(last.destination(), Some(revision_path.as_str()));
    }

    /// PROPERTY: command lines compile one operation each, in order.
    #[test]
    fn property_command_lines_keep_order(
        targets in proptest::collection::vec(file_name(), 1..10)
    ) {
        let raw: String = targets
            .iter()
            .map(|t| format!("delete {t}\n"))
            .collect();

        let batch = compile(&raw, "/site", &LocalScope::unrestricted()).unwrap();
        let sources: Vec<&str> = batch.iter().map(|op| op.source.as_str()).collect();
        let expected: Vec<String> = targets.iter().map(|t| format!("/site/{t}")).collect();
        prop_assert_eq!(sources, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
