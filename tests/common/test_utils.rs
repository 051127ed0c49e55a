#![allow(dead_code)]
use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// The descriptor used throughout the scenarios.
pub const SCENARIO_XML: &str = r#"<project name="P" default="run"><target name="run" description="Runs it"/><target name="clean"/></project>"#;

/// A scratch workspace holding build files, a settings file and optionally a fake Ant.
pub struct TestWorkspace {
    /// Dropping this removes everything.
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().to_path_buf();
        Ok(TestWorkspace { temp_dir, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("config").join("settings.toml")
    }

    /// Writes `contents` to `relative` (creating directories) and returns the absolute path.
    pub fn write_build_file(&self, relative: &str, contents: &str) -> IoResult<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates `ant-home/bin/ant`, a shell script that echoes its arguments.
    #[cfg(unix)]
    pub fn create_fake_ant(&self) -> IoResult<PathBuf> {
        self.create_ant_script("ant-home", "#!/bin/sh\necho \"FAKE ANT $*\"\n")
    }

    /// Creates `broken-ant/bin/ant`, which reports a failed build and exits 1.
    #[cfg(unix)]
    pub fn create_failing_ant(&self) -> IoResult<PathBuf> {
        self.create_ant_script("broken-ant", "#!/bin/sh\necho \"BUILD FAILED\"\nexit 1\n")
    }

    #[cfg(unix)]
    fn create_ant_script(&self, home: &str, script: &str) -> IoResult<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let home = self.root.join(home);
        let bin = home.join("bin");
        fs::create_dir_all(&bin)?;
        let ant = bin.join("ant");
        fs::write(&ant, script)?;
        fs::set_permissions(&ant, fs::Permissions::from_mode(0o755))?;
        Ok(home)
    }
}
