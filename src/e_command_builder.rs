use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

/// A fully resolved request to run the build tool.
///
/// Conceptually `<program> -f <build_file> [<additional_args>] [<target>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: PathBuf,
    pub build_file: PathBuf,
    /// Opaque, inserted verbatim.
    pub additional_args: String,
    /// `None` lets the tool pick its own default.
    pub target: Option<String>,
}

/// A builder that constructs an [`Invocation`] for a build file.
///
/// # Example
/// ```
/// use ant_e::AntCommandBuilder;
///
/// let inv = AntCommandBuilder::new("/opt/ant/bin/ant")
///     .with_build_file("/work/build.xml")
///     .with_additional_args("-emacs")
///     .with_target("dist")
///     .build();
/// assert_eq!(inv.command_line(), "/opt/ant/bin/ant -f /work/build.xml -emacs dist");
/// ```
pub struct AntCommandBuilder {
    program: PathBuf,
    build_file: PathBuf,
    additional_args: String,
    target: Option<String>,
}

impl AntCommandBuilder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        AntCommandBuilder {
            program: program.into(),
            build_file: PathBuf::new(),
            additional_args: String::new(),
            target: None,
        }
    }

    pub fn with_build_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_file = path.into();
        self
    }

    /// Sets the caller's extra arguments, kept as typed; blank strings are dropped.
    pub fn with_additional_args(mut self, args: &str) -> Self {
        self.additional_args = if args.trim().is_empty() {
            String::new()
        } else {
            args.to_string()
        };
        self
    }

    /// Sets the target to run; an empty name means "no explicit target".
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = (!target.is_empty()).then(|| target.to_string());
        self
    }

    pub fn build(self) -> Invocation {
        Invocation {
            program: self.program,
            build_file: self.build_file,
            additional_args: self.additional_args,
            target: self.target,
        }
    }
}

impl Invocation {
    /// Arguments after the program when no shell is involved.
    ///
    /// The additional arguments are not part of this list; see [`Invocation::to_command`].
    pub fn direct_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.build_file.to_string_lossy().to_string(),
        ];
        if let Some(target) = &self.target {
            args.push(target.clone());
        }
        args
    }

    /// The command line as a user would type it.
    pub fn command_line(&self) -> String {
        let mut parts = vec![
            quote(&self.program.to_string_lossy()),
            "-f".to_string(),
            quote(&self.build_file.to_string_lossy()),
        ];
        if !self.additional_args.is_empty() {
            parts.push(self.additional_args.clone());
        }
        if let Some(target) = &self.target {
            parts.push(quote(target));
        }
        parts.join(" ")
    }

    /// Directory the tool runs in: the build file's own directory.
    pub fn working_dir(&self) -> Option<&Path> {
        self.build_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Builds a `std::process::Command`.
    ///
    /// With additional arguments present the line goes through the platform
    /// shell so the string is interpreted exactly as typed.
    pub fn to_command(&self) -> Command {
        let mut cmd = if self.additional_args.is_empty() {
            let mut cmd = Command::new(&self.program);
            cmd.args(self.direct_args());
            cmd
        } else if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(self.command_line());
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(self.command_line());
            cmd
        };
        if let Some(dir) = self.working_dir() {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[cfg(not(windows))]
fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(windows)]
fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"', '&', '|', '<', '>', '^']) {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\"\""))
    }
}
