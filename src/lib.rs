#![doc = include_str!("../README.md")]

// Re-export std common modules
pub mod prelude {
    pub use std::env;
    pub use std::fs;
    pub use std::io;
    pub use std::path::{Path, PathBuf};
    pub use std::process::Child;
    pub use std::process::Command;
    pub use std::process::Stdio;
    pub use std::sync::{Arc, Mutex};
    pub use tracing::{debug, info, trace, warn};
}

pub mod e_target;
pub use e_target::{BuildFile, Category, Target};
pub mod e_classify;
pub use e_classify::classify;
pub mod e_parser;
pub use e_parser::{parse, parse_str, ParseError};
pub mod e_settings;
pub use e_settings::{
    MemorySettingsStore, Settings, SettingsError, SettingsStore, TomlSettingsStore,
};
pub mod e_registry;
pub use e_registry::{normalize_path, Refresh, Registry, SkipReason, SkippedFile};
pub mod e_command_builder;
pub use e_command_builder::{AntCommandBuilder, Invocation};
pub mod e_runner;
pub use e_runner::{ProcessLauncher, RecordingLauncher, SpawnLauncher};
pub mod e_dispatch;
pub use e_dispatch::{resolve_tool, DispatchError, Dispatcher, ToolConfig};
pub mod e_locate;
pub use e_locate::{locate_target, TargetLocation};
pub mod e_command;
pub use e_command::{
    default_command, execute, menu_for, CommandError, Editor, MenuItem, NodeCommand, Outcome, Selection,
    SystemEditor,
};
pub mod e_logging;
pub mod e_cli;
pub use e_cli::Cli;
