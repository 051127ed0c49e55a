use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "ant-e is for Execute: register Ant build files, explore their targets, run them.", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to $ANT_E_SETTINGS, then the user config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register one or more build files.
    Add {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Unregister a build file.
    Remove {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// List registered build files in registration order.
    List {
        #[arg(long, help = "Print JSON instead of text.")]
        json: bool,
    },
    /// Show the targets of every registered build file, or of a single one.
    Targets {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
        #[arg(long, help = "Print JSON instead of text.")]
        json: bool,
    },
    /// Run a target (the descriptor's default when omitted).
    Run {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "TARGET")]
        target: Option<String>,
        /// Additional arguments for this run, replacing the configured ones.
        #[arg(long = "args", value_name = "STRING", allow_hyphen_values = true)]
        args: Option<String>,
        /// Return as soon as the tool has started.
        #[arg(long)]
        no_wait: bool,
        /// Print the exit code of the tool when it finishes.
        #[arg(long = "pX", default_value_t = false)]
        print_exit_code: bool,
    },
    /// Open a build file in the editor, at a target when given.
    Edit {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "TARGET")]
        target: Option<String>,
        /// Only print where the target is; do not open an editor.
        #[arg(long)]
        print: bool,
    },
    /// Inspect or change the tool settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current settings.
    Show,
    /// Set the Ant installation directory (or executable).
    SetPath {
        #[arg(value_name = "DIR")]
        path: String,
    },
    /// Set the default additional arguments.
    SetArgs {
        #[arg(value_name = "STRING", allow_hyphen_values = true)]
        args: String,
    },
    /// Find `ant` on PATH and store its installation directory.
    Detect,
}
