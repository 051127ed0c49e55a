// src/e_command.rs
//! Plain command values a view emits for a selected tree node, and their execution.
use crate::prelude::*;
use crate::{
    locate_target, BuildFile, DispatchError, Dispatcher, Invocation, ProcessLauncher, Registry,
    SettingsError, SettingsStore, Target, TargetLocation,
};
use thiserror::Error;

/// A node selected in a build-file view.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    BuildFile(&'a BuildFile),
    Target(&'a BuildFile, &'a Target),
}

/// What the user asked to do with a node.
///
/// An empty `target` on `Run` means the descriptor's default target; on
/// `Edit` it means the top of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCommand {
    Run { file: PathBuf, target: String },
    Edit { file: PathBuf, target: String },
    Remove { file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub command: NodeCommand,
}

/// Context menu entries for a node, in display order.
pub fn menu_for(selection: Selection<'_>) -> Vec<MenuItem> {
    match selection {
        Selection::BuildFile(file) => vec![
            MenuItem {
                label: "Run default target",
                command: NodeCommand::Run {
                    file: file.path.clone(),
                    target: String::new(),
                },
            },
            MenuItem {
                label: "Edit file",
                command: NodeCommand::Edit {
                    file: file.path.clone(),
                    target: String::new(),
                },
            },
            MenuItem {
                label: "Remove",
                command: NodeCommand::Remove {
                    file: file.path.clone(),
                },
            },
        ],
        Selection::Target(file, target) => vec![
            MenuItem {
                label: "Run target",
                command: NodeCommand::Run {
                    file: file.path.clone(),
                    target: target.name.clone(),
                },
            },
            MenuItem {
                label: "Show in Editor",
                command: NodeCommand::Edit {
                    file: file.path.clone(),
                    target: target.name.clone(),
                },
            },
        ],
    }
}

/// Activating a node (double-click, Enter) runs it.
pub fn default_command(selection: Selection<'_>) -> NodeCommand {
    match selection {
        Selection::BuildFile(file) => NodeCommand::Run {
            file: file.path.clone(),
            target: String::new(),
        },
        Selection::Target(file, target) => NodeCommand::Run {
            file: file.path.clone(),
            target: target.name.clone(),
        },
    }
}

/// Opens a descriptor for editing, optionally at a target's start tag.
pub trait Editor {
    fn open(&self, file: &Path, location: Option<&TargetLocation>) -> io::Result<()>;
}

/// Uses `$VISUAL`/`$EDITOR` (`editor +LINE FILE`) and falls back to the OS opener.
#[derive(Debug, Clone, Default)]
pub struct SystemEditor;

impl Editor for SystemEditor {
    fn open(&self, file: &Path, location: Option<&TargetLocation>) -> io::Result<()> {
        let editor = env::var("VISUAL")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()));

        if let Some(editor) = editor {
            let mut parts = editor.split_whitespace();
            let program = parts.next().unwrap_or_default();
            let mut cmd = Command::new(program);
            cmd.args(parts);
            if let Some(loc) = location {
                cmd.arg(format!("+{}", loc.line));
            }
            cmd.arg(file);
            debug!(editor = %editor, file = %file.display(), "opening editor");
            let status = cmd.status()?;
            if !status.success() {
                warn!(code = ?status.code(), "editor exited unsuccessfully");
            }
            return Ok(());
        }
        open_with_os(file)
    }
}

#[cfg(feature = "open-editor")]
fn open_with_os(file: &Path) -> io::Result<()> {
    debug!(file = %file.display(), "opening with the system handler");
    open::that(file)
}

#[cfg(not(feature = "open-editor"))]
fn open_with_os(file: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("set $EDITOR to open {}", file.display()),
    ))
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("cannot open {}: {source}", path.display())]
    Edit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What executing a [`NodeCommand`] did.
#[derive(Debug)]
pub enum Outcome {
    Dispatched(Invocation),
    Opened {
        file: PathBuf,
        location: Option<TargetLocation>,
    },
    Removed { file: PathBuf, was_registered: bool },
}

/// Carries out a command against the registry, dispatcher and editor.
pub fn execute<S, L, E>(
    command: &NodeCommand,
    registry: &mut Registry<S>,
    dispatcher: &Dispatcher<L>,
    editor: &E,
) -> Result<Outcome, CommandError>
where
    S: SettingsStore,
    L: ProcessLauncher,
    E: Editor + ?Sized,
{
    match command {
        NodeCommand::Run { file, target } => {
            let invocation = dispatcher.dispatch(file, target)?;
            Ok(Outcome::Dispatched(invocation))
        }
        NodeCommand::Edit { file, target } => {
            let location = if target.is_empty() {
                None
            } else {
                let text = fs::read_to_string(file).map_err(|source| CommandError::Edit {
                    path: file.clone(),
                    source,
                })?;
                let found = locate_target(&text, target);
                if found.is_none() {
                    warn!(target = %target, file = %file.display(), "target tag not found");
                }
                found
            };
            editor
                .open(file, location.as_ref())
                .map_err(|source| CommandError::Edit {
                    path: file.clone(),
                    source,
                })?;
            Ok(Outcome::Opened {
                file: file.clone(),
                location,
            })
        }
        NodeCommand::Remove { file } => {
            let was_registered = registry.remove(file)?;
            Ok(Outcome::Removed {
                file: file.clone(),
                was_registered,
            })
        }
    }
}
