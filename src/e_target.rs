// src/e_target.rs
use std::path::PathBuf;

use serde::Serialize;

/// How a target is presented and whether it is meant to be run directly.
///
/// Derived from the target and its descriptor's default, never stored on disk.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The target the descriptor runs when none is chosen.
    Default,
    /// A documented target (it carries a description).
    Public,
    /// An undocumented helper target.
    Internal,
}

/// One target within a build descriptor.
///
/// # Example
/// ```
/// use ant_e::{Category, Target};
///
/// let target = Target::new("compile", "Compiles the sources", "dist");
/// assert_eq!(target.category, Category::Public);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub description: String,
    pub category: Category,
}

impl Target {
    /// Builds a target and classifies it against the descriptor's default target name.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        default_target_name: &str,
    ) -> Self {
        let name = name.into();
        let description = description.into();
        let category = crate::classify(&name, &description, default_target_name);
        Target {
            name,
            description,
            category,
        }
    }

    /// Whether a view should render this target emphasized (bold).
    pub fn emphasized(&self) -> bool {
        self.category.emphasized()
    }
}

/// A parsed build descriptor.
///
/// Instances are transient: they are rebuilt from disk on every refresh and
/// the `targets` keep document order, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFile {
    pub path: PathBuf,
    pub project_name: String,
    pub description: String,
    pub default_target_name: String,
    pub targets: Vec<Target>,
}

impl BuildFile {
    /// The target a run without an explicit choice resolves to, if the descriptor declares it.
    pub fn default_target(&self) -> Option<&Target> {
        self.targets
            .iter()
            .find(|t| t.category == Category::Default)
    }

    /// First target with the given name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn has_default(&self) -> bool {
        !self.default_target_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BuildFile {
        BuildFile {
            path: PathBuf::from("/work/build.xml"),
            project_name: "P".to_string(),
            description: String::new(),
            default_target_name: "run".to_string(),
            targets: vec![
                Target::new("clean", "", "run"),
                Target::new("run", "Runs it", "run"),
                Target::new("run", "", "run"),
            ],
        }
    }

    #[test]
    fn default_target_is_first_matching_name() {
        let file = sample();
        let def = file.default_target().unwrap();
        assert_eq!(def.name, "run");
        assert_eq!(def.description, "Runs it");
        assert!(def.emphasized());
    }

    #[test]
    fn duplicates_are_kept_in_document_order() {
        let file = sample();
        let names: Vec<_> = file.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["clean", "run", "run"]);
        assert_eq!(file.targets[2].category, Category::Default);
    }

    #[test]
    fn lookup_by_name() {
        let file = sample();
        assert_eq!(file.target("clean").unwrap().category, Category::Internal);
        assert!(file.target("missing").is_none());
        assert!(file.has_default());
    }
}
