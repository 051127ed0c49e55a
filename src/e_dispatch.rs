// src/e_dispatch.rs
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::{parse, AntCommandBuilder, Invocation, ParseError, ProcessLauncher, Settings};

/// Why a (build file, target) pair could not be launched.
///
/// All precondition failures are reported before anything is spawned.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Ant is not configured: {reason}")]
    ToolNotConfigured { reason: String },
    #[error("build file {} no longer exists", path.display())]
    FileMissing { path: PathBuf },
    #[error("cannot resolve the default target: {0}")]
    DescriptorInvalid(#[source] ParseError),
    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The tool-related part of [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolConfig {
    pub installation_path: String,
    pub additional_args: String,
}

impl From<&Settings> for ToolConfig {
    fn from(settings: &Settings) -> Self {
        ToolConfig {
            installation_path: settings.installation_path.clone(),
            additional_args: settings.additional_args.clone(),
        }
    }
}

#[cfg(windows)]
const TOOL_CANDIDATES: &[&str] = &["bin/ant.bat", "bin/ant.cmd", "bin/ant.exe"];
#[cfg(not(windows))]
const TOOL_CANDIDATES: &[&str] = &["bin/ant"];

/// Resolves the configured installation path to a runnable executable.
///
/// The path may name the installation directory or the executable itself.
pub fn resolve_tool(installation_path: &str) -> Result<PathBuf, DispatchError> {
    let installation_path = installation_path.trim();
    if installation_path.is_empty() {
        return Err(DispatchError::ToolNotConfigured {
            reason: "installation path is not set".to_string(),
        });
    }
    let root = Path::new(installation_path);
    if root.is_file() {
        return runnable(root);
    }
    if root.is_dir() {
        for candidate in TOOL_CANDIDATES {
            let exe = root.join(candidate);
            if exe.is_file() {
                return runnable(&exe);
            }
        }
        return Err(DispatchError::ToolNotConfigured {
            reason: format!("no Ant launcher under {}", root.join("bin").display()),
        });
    }
    Err(DispatchError::ToolNotConfigured {
        reason: format!("{} does not exist", root.display()),
    })
}

#[cfg(unix)]
fn runnable(exe: &Path) -> Result<PathBuf, DispatchError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = exe
        .metadata()
        .map(|m| m.permissions().mode())
        .unwrap_or_default();
    if mode & 0o111 == 0 {
        return Err(DispatchError::ToolNotConfigured {
            reason: format!("{} is not executable", exe.display()),
        });
    }
    Ok(exe.to_path_buf())
}

#[cfg(not(unix))]
fn runnable(exe: &Path) -> Result<PathBuf, DispatchError> {
    Ok(exe.to_path_buf())
}

/// Turns a (build file, target) selection into an [`Invocation`] and hands it to a launcher.
///
/// Each dispatch is independent: nothing is queued or tracked afterwards.
pub struct Dispatcher<L: ProcessLauncher> {
    config: ToolConfig,
    launcher: L,
}

impl<L: ProcessLauncher> Dispatcher<L> {
    pub fn new(config: ToolConfig, launcher: L) -> Self {
        Dispatcher { config, launcher }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Builds the invocation without launching it.
    ///
    /// An empty `target_name` re-reads the descriptor for its default target;
    /// `additional_args` of `None` uses the configured default.
    pub fn prepare(
        &self,
        build_file: &Path,
        target_name: &str,
        additional_args: Option<&str>,
    ) -> Result<Invocation, DispatchError> {
        if !build_file.is_file() {
            return Err(DispatchError::FileMissing {
                path: build_file.to_path_buf(),
            });
        }

        let target = if target_name.is_empty() {
            let descriptor = parse(build_file).map_err(DispatchError::DescriptorInvalid)?;
            debug!(
                path = %build_file.display(),
                default = %descriptor.default_target_name,
                "resolved default target"
            );
            descriptor.default_target_name
        } else {
            target_name.to_string()
        };

        let program = resolve_tool(&self.config.installation_path)?;
        let args = additional_args.unwrap_or(&self.config.additional_args);

        Ok(AntCommandBuilder::new(program)
            .with_build_file(build_file)
            .with_additional_args(args)
            .with_target(&target)
            .build())
    }

    /// Prepares and launches with the configured additional arguments.
    pub fn dispatch(
        &self,
        build_file: &Path,
        target_name: &str,
    ) -> Result<Invocation, DispatchError> {
        self.dispatch_with_args(build_file, target_name, None)
    }

    /// Prepares and launches, optionally overriding the configured additional arguments.
    pub fn dispatch_with_args(
        &self,
        build_file: &Path,
        target_name: &str,
        additional_args: Option<&str>,
    ) -> Result<Invocation, DispatchError> {
        let invocation = self.prepare(build_file, target_name, additional_args)?;
        self.launch(&invocation)?;
        Ok(invocation)
    }

    /// Hands an already prepared invocation to the launcher.
    pub fn launch(&self, invocation: &Invocation) -> Result<(), DispatchError> {
        self.launcher
            .launch(invocation)
            .map_err(|source| DispatchError::Launch {
                program: invocation.program.clone(),
                source,
            })?;
        info!(
            build_file = %invocation.build_file.display(),
            target = invocation.target.as_deref().unwrap_or("<tool default>"),
            "dispatched"
        );
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::RecordingLauncher;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{tempdir, TempDir};

    fn fake_ant_home() -> TempDir {
        let home = tempdir().unwrap();
        let bin = home.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let ant = bin.join("ant");
        fs::write(&ant, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&ant, fs::Permissions::from_mode(0o755)).unwrap();
        home
    }

    fn config(home: &TempDir) -> ToolConfig {
        ToolConfig {
            installation_path: home.path().to_string_lossy().to_string(),
            additional_args: "-emacs".to_string(),
        }
    }

    #[test]
    fn unset_tool_is_not_configured() {
        assert!(matches!(resolve_tool("  "), Err(DispatchError::ToolNotConfigured { .. })));
        assert!(matches!(
            resolve_tool("/no/such/ant/home"),
            Err(DispatchError::ToolNotConfigured { .. })
        ));
    }

    #[test]
    fn non_executable_tool_is_rejected() {
        let home = tempdir().unwrap();
        let exe = home.path().join("ant");
        fs::write(&exe, "").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            resolve_tool(&exe.to_string_lossy()),
            Err(DispatchError::ToolNotConfigured { .. })
        ));
    }

    #[test]
    fn tool_resolves_from_home_or_executable() {
        let home = fake_ant_home();
        let expected = home.path().join("bin").join("ant");
        assert_eq!(resolve_tool(&home.path().to_string_lossy()).unwrap(), expected);
        assert_eq!(resolve_tool(&expected.to_string_lossy()).unwrap(), expected);
    }

    #[test]
    fn missing_file_is_reported_before_tool() {
        let dispatcher = Dispatcher::new(ToolConfig::default(), RecordingLauncher::new());
        let err = dispatcher
            .dispatch(Path::new("/no/such/file.xml"), "run")
            .unwrap_err();
        assert!(matches!(err, DispatchError::FileMissing { .. }));
        assert!(dispatcher.launcher().launched().is_empty());
    }

    #[test]
    fn empty_target_resolves_default() {
        let home = fake_ant_home();
        let dir = tempdir().unwrap();
        let build = dir.path().join("build.xml");
        fs::write(
            &build,
            r#"<project name="P" default="run"><target name="run" description="Runs it"/><target name="clean"/></project>"#,
        )
        .unwrap();

        let dispatcher = Dispatcher::new(config(&home), RecordingLauncher::new());
        let inv = dispatcher.dispatch(&build, "").unwrap();
        assert_eq!(inv.target.as_deref(), Some("run"));
        assert_eq!(inv.additional_args, "-emacs");
        assert_eq!(dispatcher.launcher().launched(), vec![inv]);
    }

    #[test]
    fn no_default_means_no_target() {
        let home = fake_ant_home();
        let dir = tempdir().unwrap();
        let build = dir.path().join("build.xml");
        fs::write(&build, r#"<project><target name="a"/></project>"#).unwrap();

        let dispatcher = Dispatcher::new(config(&home), RecordingLauncher::new());
        let inv = dispatcher.dispatch_with_args(&build, "", Some("")).unwrap();
        assert_eq!(inv.target, None);
        assert_eq!(inv.additional_args, "");
    }

    #[test]
    fn invalid_descriptor_only_matters_for_default_resolution() {
        let home = fake_ant_home();
        let dir = tempdir().unwrap();
        let build = dir.path().join("build.xml");
        fs::write(&build, "<project>").unwrap();

        let dispatcher = Dispatcher::new(config(&home), RecordingLauncher::new());
        assert!(matches!(
            dispatcher.dispatch(&build, ""),
            Err(DispatchError::DescriptorInvalid(_))
        ));
        assert!(dispatcher.dispatch(&build, "explicit").is_ok());
        assert_eq!(dispatcher.launcher().launched().len(), 1);
    }

    #[test]
    fn tool_not_configured_spawns_nothing() {
        let dir = tempdir().unwrap();
        let build = dir.path().join("build.xml");
        fs::write(&build, "<project/>").unwrap();
        let dispatcher = Dispatcher::new(ToolConfig::default(), RecordingLauncher::new());
        assert!(matches!(
            dispatcher.dispatch(&build, "x"),
            Err(DispatchError::ToolNotConfigured { .. })
        ));
        assert!(dispatcher.launcher().launched().is_empty());
    }
}
