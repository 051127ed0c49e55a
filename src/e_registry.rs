// src/e_registry.rs
use std::env;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{parse, BuildFile, ParseError, SettingsError, SettingsStore};

/// Ordered, duplicate-free list of registered build files.
///
/// Parsed content is never cached; [`Registry::refresh`] re-reads every
/// descriptor. Mutations are persisted through the store before they take
/// effect in memory, so a failed save leaves the registry untouched.
pub struct Registry<S: SettingsStore> {
    paths: Vec<PathBuf>,
    store: S,
}

/// Why a registered file is absent from a refresh.
#[derive(Debug)]
pub enum SkipReason {
    /// The file no longer exists on disk.
    Missing,
    /// The file exists but could not be parsed.
    Invalid(ParseError),
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of re-reading every registered descriptor.
#[derive(Debug, Default)]
pub struct Refresh {
    pub build_files: Vec<BuildFile>,
    pub skipped: Vec<SkippedFile>,
}

impl<S: SettingsStore> Registry<S> {
    /// Loads the registered paths from `store`.
    pub fn open(store: S) -> Result<Self, SettingsError> {
        let settings = store.load()?;
        Ok(Self::new(settings.registered_build_files, store))
    }

    /// Starts from an explicit path list. Paths are normalized and deduplicated.
    pub fn new(paths: Vec<PathBuf>, store: S) -> Self {
        let mut registry = Registry {
            paths: Vec::with_capacity(paths.len()),
            store,
        };
        for path in paths {
            if let Some(path) = normalize_path(&path) {
                if !registry.paths.contains(&path) {
                    registry.paths.push(path);
                }
            }
        }
        registry
    }

    /// Appends the paths not yet registered, in input order, and returns how many were added.
    pub fn add<I, P>(&mut self, candidates: I) -> Result<usize, SettingsError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut next = self.paths.clone();
        for candidate in candidates {
            let Some(path) = normalize_path(candidate.as_ref()) else {
                debug!("ignoring empty build file path");
                continue;
            };
            if next.contains(&path) {
                debug!(path = %path.display(), "already registered");
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("xml") {
                debug!(path = %path.display(), "registering a file without .xml extension");
            }
            next.push(path);
        }

        let added = next.len() - self.paths.len();
        if added > 0 {
            self.persist(&next)?;
            info!(added, "registered build files");
            self.paths = next;
        }
        Ok(added)
    }

    /// Removes `path` if registered. Returns whether anything was removed.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Result<bool, SettingsError> {
        let Some(path) = normalize_path(path.as_ref()) else {
            return Ok(false);
        };
        let Some(index) = self.paths.iter().position(|p| *p == path) else {
            debug!(path = %path.display(), "not registered, nothing to remove");
            return Ok(false);
        };
        let mut next = self.paths.clone();
        next.remove(index);
        self.persist(&next)?;
        info!(path = %path.display(), "unregistered build file");
        self.paths = next;
        Ok(true)
    }

    /// Registered paths in registration order.
    pub fn list(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        normalize_path(path.as_ref()).is_some_and(|p| self.paths.contains(&p))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parses every registered file still on disk, isolating per-file failures.
    pub fn refresh(&self) -> Refresh {
        let mut refresh = Refresh::default();
        for path in &self.paths {
            if !path.is_file() {
                debug!(path = %path.display(), "registered build file is missing");
                refresh.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: SkipReason::Missing,
                });
                continue;
            }
            match parse(path) {
                Ok(build_file) => refresh.build_files.push(build_file),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping build file");
                    refresh.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: SkipReason::Invalid(err),
                    });
                }
            }
        }
        refresh
    }

    /// The successfully parsed build files, in registry order.
    pub fn refresh_view(&self) -> Vec<BuildFile> {
        self.refresh().build_files
    }

    fn persist(&self, paths: &[PathBuf]) -> Result<(), SettingsError> {
        let mut settings = self.store.load()?;
        settings.registered_build_files = paths.to_vec();
        self.store.save(&settings)
    }
}

/// Makes `path` absolute against the working directory and folds `.` and `..` lexically.
///
/// Returns `None` for an empty path. The file does not need to exist.
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().ok()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Some(normalized)
}
