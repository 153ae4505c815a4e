//! Scenario: Backup And Restore
//!
//! Journey: upload a directory, then download it again somewhere else.
//! With no ignore patterns the restored tree matches byte for byte.

use std::fs;

use ferry::domain::ports::TreeTransfer;
use ferry::domain::value_objects::{Endpoint, LocalScope, Protocol};
use ferry::infrastructure::backends::MemoryBackend;
use ferry::{compile, DeployOptions, DeployUseCase};
use tempfile::tempdir;

use crate::common::*;

fn round_trip(mode: TreeTransfer) {
    let dir = tempdir().unwrap();
    site_tree(dir.path());
    let dist = dir.path().join("dist");
    let restore = dir.path().join("restore");

    let actions = format!(
        "upload {} /backup\ndownload /backup {}",
        quoted(&dist),
        quoted(&restore)
    );
    let batch = compile(&actions, "", &LocalScope::unrestricted()).unwrap();

    let mut use_case = DeployUseCase::new(MemoryBackend::new().with_tree_transfer(mode));
    let endpoint = Endpoint::new(Protocol::Sftp, "h", "u").with_password("p");
    let report = use_case.execute(&endpoint, &batch, &DeployOptions::new());
    assert!(report.is_success(), "{report:?}");

    for rel in ["index.html", "css/site.css", "debug.log"] {
        assert_eq!(
            fs::read(dist.join(rel)).unwrap(),
            fs::read(restore.join(rel)).unwrap(),
            "{rel} differs"
        );
    }
}

#[test]
fn scenario_round_trip_per_entry() {
    round_trip(TreeTransfer::PerEntry);
}

#[test]
fn scenario_round_trip_bulk() {
    round_trip(TreeTransfer::Bulk);
}
