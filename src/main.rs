//! # ant-e
//!
//! `ant-e` keeps a list of Ant build files, shows the targets they define and
//! runs a chosen target (or the file's default) through the configured Ant
//! installation.
//!
//! ## Quick Start
//! ```sh
//! ant-e config set-path /opt/apache-ant
//! ant-e add build.xml
//! ant-e targets
//! ant-e run build.xml dist
//! ```

use anyhow::{bail, Context, Result};
use ant_e::e_cli::{Commands, ConfigAction};
use ant_e::e_command::SystemEditor;
use ant_e::e_settings::default_settings_path;
use ant_e::{
    execute, locate_target, normalize_path, parse, resolve_tool, BuildFile, Cli, Dispatcher,
    NodeCommand, Outcome, Registry, SettingsStore, SkipReason, SpawnLauncher, TomlSettingsStore,
    ToolConfig,
};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    ant_e::e_logging::init(cli.verbose);
    debug!("CLI options: {:?}", cli);

    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    debug!(path = %settings_path.display(), "using settings file");
    let store = TomlSettingsStore::new(settings_path);

    match cli.command {
        Commands::Add { paths } => {
            let mut registry = open_registry(&store)?;
            for path in &paths {
                if !path.exists() {
                    warn!(path = %path.display(), "registering a build file that does not exist yet");
                }
            }
            let added = registry.add(&paths).context("Failed to save the registry")?;
            println!("Added {} build file(s).", added);
        }
        Commands::Remove { path } => {
            let mut registry = open_registry(&store)?;
            let dispatcher = Dispatcher::new(ToolConfig::default(), SpawnLauncher::detached());
            let command = NodeCommand::Remove { file: absolute(&path)? };
            if let Outcome::Removed { file, was_registered } =
                execute(&command, &mut registry, &dispatcher, &SystemEditor)?
            {
                if was_registered {
                    println!("Removed {}", file.display());
                } else {
                    println!("{} was not registered.", file.display());
                }
            }
        }
        Commands::List { json } => {
            let registry = open_registry(&store)?;
            if json {
                let entries: Vec<_> = registry
                    .list()
                    .iter()
                    .map(|p| ListEntry {
                        path: p,
                        exists: p.is_file(),
                    })
                    .collect();
                print_json(&entries)?;
            } else if registry.list().is_empty() {
                println!("No build files registered.");
            } else {
                for path in registry.list() {
                    let marker = if path.is_file() { "" } else { "  (missing)" };
                    println!("{}{}", path.display(), marker);
                }
            }
        }
        Commands::Targets { path, json } => {
            let build_files = match path {
                Some(path) => {
                    let path = absolute(&path)?;
                    vec![parse(&path).with_context(|| format!("Failed to read {}", path.display()))?]
                }
                None => {
                    let refresh = open_registry(&store)?.refresh();
                    for skipped in &refresh.skipped {
                        match &skipped.reason {
                            SkipReason::Missing => {
                                eprintln!("skipped {}: file not found", skipped.path.display())
                            }
                            SkipReason::Invalid(err) => eprintln!("skipped {}: {}", skipped.path.display(), err),
                        }
                    }
                    refresh.build_files
                }
            };
            if json {
                print_json(&build_files)?;
            } else {
                for file in &build_files {
                    print_build_file(file);
                }
            }
        }
        Commands::Run {
            path,
            target,
            args,
            no_wait,
            print_exit_code,
        } => {
            let settings = store.load()?;
            let mut launcher = SpawnLauncher::default();
            launcher.wait = !no_wait;
            launcher.print_exit_code = print_exit_code;
            let dispatcher = Dispatcher::new(ToolConfig::from(&settings), launcher);
            let path = absolute(&path)?;
            let target = target.unwrap_or_default();
            let invocation = dispatcher.prepare(&path, &target, args.as_deref())?;
            println!("Running: {}", invocation.command_line());
            dispatcher.launch(&invocation)?;
            if let Some(status) = dispatcher.launcher().exit_status() {
                if !status.success() {
                    eprintln!("Build failed: {}", status);
                    std::process::exit(status.code().unwrap_or(1));
                }
            }
        }
        Commands::Edit { path, target, print } => {
            let path = absolute(&path)?;
            let target = target.unwrap_or_default();
            if print {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if target.is_empty() {
                    println!("{}:1:1", path.display());
                    return Ok(());
                }
                match locate_target(&text, &target) {
                    Some(loc) => println!("{}:{}:{}", path.display(), loc.line, loc.column),
                    None => bail!("target '{}' not found in {}", target, path.display()),
                }
                return Ok(());
            }
            let mut registry = open_registry(&store)?;
            let dispatcher = Dispatcher::new(ToolConfig::default(), SpawnLauncher::detached());
            let command = NodeCommand::Edit { file: path, target };
            execute(&command, &mut registry, &dispatcher, &SystemEditor)?;
        }
        Commands::Config { action } => run_config(&store, action)?,
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct ListEntry<'a> {
    path: &'a Path,
    exists: bool,
}

fn open_registry(store: &TomlSettingsStore) -> Result<Registry<&TomlSettingsStore>> {
    Registry::open(store)
        .with_context(|| format!("Failed to load settings from {}", store.path().display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    normalize_path(path).with_context(|| format!("Invalid path '{}'", path.display()))
}

fn print_build_file(file: &BuildFile) {
    println!("{}  ({})", file.project_name, file.path.display());
    if !file.description.is_empty() {
        println!("  {}", file.description);
    }
    let width = file.targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for target in &file.targets {
        let mark = if target.emphasized() { "*" } else { " " };
        println!(
            "  {} {:<width$}  [{}]  {}",
            mark,
            target.name,
            target.category.tag(),
            target.description,
            width = width
        );
    }
}

#[cfg(feature = "uses_serde")]
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "uses_serde"))]
fn print_json<T: serde::Serialize>(_value: &T) -> Result<()> {
    bail!("this build of ant-e has no JSON support (enable the `uses_serde` feature)")
}

fn run_config(store: &TomlSettingsStore, action: ConfigAction) -> Result<()> {
    let mut settings = store.load()?;
    match action {
        ConfigAction::Show => {
            println!("# {}", store.path().display());
            print!("{}", toml::to_string_pretty(&settings)?);
            return Ok(());
        }
        ConfigAction::SetPath { path } => {
            settings.installation_path = path;
            if let Err(e) = resolve_tool(&settings.installation_path) {
                eprintln!("warning: {}", e);
            }
        }
        ConfigAction::SetArgs { args } => settings.additional_args = args,
        ConfigAction::Detect => {
            let exe = which::which("ant").context("ant was not found on PATH")?;
            let exe = fs::canonicalize(&exe).unwrap_or(exe);
            let home = match exe.parent() {
                Some(bin) if bin.file_name().is_some_and(|n| n == "bin") => {
                    bin.parent().unwrap_or(bin).to_path_buf()
                }
                _ => exe.clone(),
            };
            println!("Found Ant at {}", exe.display());
            settings.installation_path = home.to_string_lossy().to_string();
        }
    }
    store.save(&settings)?;
    println!("Saved {}", store.path().display());
    Ok(())
}
