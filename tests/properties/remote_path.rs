//! Property tests for remote path helpers.

use std::path::Path;

use proptest::prelude::*;

use ferry::domain::value_objects::{remote_file_name, remote_join, remote_parent, LocalScope};

fn segments() -> impl Strategy<Value = Vec<String>> {
    let segment = proptest::string::string_regex("[A-Za-z0-9._-]{1,12}")
        .unwrap()
        .prop_filter("no dot segments", |s| s != "." && s != "..");
    proptest::collection::vec(segment, 1..=4)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: joining onto a root puts the relative path under it.
    #[test]
    fn property_join_stays_under_root(
        root in segments(),
        rel in segments()
    ) {
        let root = format!("/{}", root.join("/"));
        let rel = rel.join("/");
        let joined = remote_join(&root, &rel);

        let root_prefix = format!("{}/", root);
        prop_assert!(joined.starts_with(&root_prefix));
        prop_assert!(joined.ends_with(&rel));
        prop_assert!(!joined.contains("//"));
    }

    /// PROPERTY: parent and file name split a joined path back apart.
    #[test]
    fn property_parent_and_name_invert_join(
        dir in segments(),
        name in segments().prop_map(|s| s[0].clone())
    ) {
        let dir = format!("/{}", dir.join("/"));
        let joined = remote_join(&dir, &name);

        prop_assert_eq!(remote_parent(&joined), Some(dir.as_str()));
        prop_assert_eq!(remote_file_name(&joined), name.as_str());
    }

    /// PROPERTY: scope containment is decided per component, so a sibling
    /// whose name merely starts with the root is outside.
    #[test]
    fn property_scope_is_component_based(
        root in segments(),
        rest in segments(),
        suffix in "[a-z0-9]{1,4}"
    ) {
        let root_path = root.join("/");
        let scope = LocalScope::new(&root_path);

        let inside = format!("{root_path}/{}", rest.join("/"));
        prop_assert!(scope.contains(Path::new(&inside)));

        let sibling = format!("{root_path}{suffix}/{}", rest.join("/"));
        prop_assert!(!scope.contains(Path::new(&sibling)));
    }
}
