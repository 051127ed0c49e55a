use crate::prelude::*;
use crate::Invocation;
use std::cell::{Cell, RefCell};
use std::process::ExitStatus;
use std::thread;
use std::time::Duration;

/// Collaborator that turns an [`Invocation`] into a running process.
///
/// The dispatcher hands over and forgets; observing output and exit codes is
/// entirely up to the implementation.
pub trait ProcessLauncher {
    fn launch(&self, invocation: &Invocation) -> io::Result<()>;
}

/// Spawns the tool with inherited stdio.
///
/// With `wait` set the launcher blocks until the tool exits and kills it on
/// Ctrl+C; otherwise the child is left running on its own.
#[derive(Debug, Clone, Default)]
pub struct SpawnLauncher {
    pub wait: bool,
    pub print_exit_code: bool,
    exit_status: Cell<Option<ExitStatus>>,
}

impl SpawnLauncher {
    pub fn detached() -> Self {
        SpawnLauncher::default()
    }

    pub fn waiting() -> Self {
        SpawnLauncher {
            wait: true,
            ..SpawnLauncher::default()
        }
    }

    /// How the last waited-for tool exited; `None` until one has finished.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status.get()
    }
}

impl ProcessLauncher for SpawnLauncher {
    fn launch(&self, invocation: &Invocation) -> io::Result<()> {
        let mut cmd = invocation.to_command();
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        info!(command = %invocation.command_line(), "launching");
        self.exit_status.set(None);
        let child = spawn(&mut cmd)?;
        debug!(pid = child.id(), "spawned");

        if !self.wait {
            return Ok(());
        }

        let child = Arc::new(Mutex::new(child));
        let child_for_handler = Arc::clone(&child);
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("Ctrl+C pressed, terminating build...");
            if let Ok(mut child) = child_for_handler.lock() {
                let _ = child.kill();
            }
        }) {
            warn!(error = %e, "could not install Ctrl+C handler");
        }

        // Poll so the handler can take the lock while we wait.
        let status = loop {
            let polled = {
                let mut guard = child
                    .lock()
                    .map_err(|_| io::Error::other("child process lock poisoned"))?;
                guard.try_wait()?
            };
            match polled {
                Some(status) => break status,
                None => thread::sleep(Duration::from_millis(50)),
            }
        };

        debug!(code = ?status.code(), "build tool exited");
        self.exit_status.set(Some(status));
        if self.print_exit_code {
            println!("Process exited with status: {:?}", status.code());
        }
        Ok(())
    }
}

/// Helper function to spawn the tool process.
/// On Windows, this sets the CREATE_NEW_PROCESS_GROUP flag.
fn spawn(cmd: &mut Command) -> io::Result<Child> {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP).spawn()
    }
    #[cfg(not(windows))]
    {
        cmd.spawn()
    }
}

/// Records invocations instead of running them.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: RefCell<Vec<Invocation>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        RecordingLauncher::default()
    }

    pub fn launched(&self) -> Vec<Invocation> {
        self.launched.borrow().clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, invocation: &Invocation) -> io::Result<()> {
        self.launched.borrow_mut().push(invocation.clone());
        Ok(())
    }
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for &L {
    fn launch(&self, invocation: &Invocation) -> io::Result<()> {
        (**self).launch(invocation)
    }
}
