// common/test_prelude.rs

// Items most CLI tests need.
pub use super::test_utils::{TestWorkspace, SCENARIO_XML};
pub use assert_cmd::Command;
pub use predicates::prelude::*;
pub use predicates::str::contains;

/// `ant-e` pointed at the workspace's private settings file.
pub fn ant_e(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("ant-e").expect("ant-e binary is built");
    cmd.env_remove("ANT_E_SETTINGS")
        .env_remove("RUST_LOG")
        .env_remove("VISUAL")
        .env_remove("EDITOR")
        .arg("--settings")
        .arg(ws.settings_path());
    cmd
}
