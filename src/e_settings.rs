// src/e_settings.rs
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable that overrides the settings file location.
pub const SETTINGS_ENV: &str = "ANT_E_SETTINGS";

/// Persisted configuration consumed by the registry and the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ant installation directory (or the `ant` executable itself).
    pub installation_path: String,
    /// Extra arguments inserted verbatim into every invocation.
    pub additional_args: String,
    /// Registered build files, in registration order.
    pub registered_build_files: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Durable home of [`Settings`]. Saves are synchronous.
pub trait SettingsStore {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlSettingsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file yet, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| SettingsError::Deserialize {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let text = toml::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Settings held in memory only, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RefCell<Settings>,
    saves: RefCell<usize>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        MemorySettingsStore {
            settings: RefCell::new(settings),
            saves: RefCell::new(0),
        }
    }

    /// Snapshot of what was last saved.
    pub fn snapshot(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.settings.borrow().clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.settings.borrow_mut() = settings.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for &S {
    fn load(&self) -> Result<Settings, SettingsError> {
        (**self).load()
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        (**self).save(settings)
    }
}

/// Where the settings file lives when `--settings` is not given.
///
/// `ANT_E_SETTINGS` wins, then the platform config directory, then the working directory.
pub fn default_settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("ant-e").join("settings.toml"),
        None => PathBuf::from("ant-e-settings.toml"),
    }
}
