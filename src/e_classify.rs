use crate::Category;

/// Classifies a target against its descriptor's default target name.
///
/// First match wins:
/// 1. the name equals a non-empty `default_target_name` -> [`Category::Default`]
/// 2. the description is non-empty -> [`Category::Public`]
/// 3. otherwise -> [`Category::Internal`]
///
/// # Example
/// ```
/// use ant_e::{classify, Category};
///
/// assert_eq!(classify("run", "", "run"), Category::Default);
/// assert_eq!(classify("doc", "Builds docs", "run"), Category::Public);
/// assert_eq!(classify("-init", "", "run"), Category::Internal);
/// ```
pub fn classify(name: &str, description: &str, default_target_name: &str) -> Category {
    if !default_target_name.is_empty() && name == default_target_name {
        Category::Default
    } else if !description.is_empty() {
        Category::Public
    } else {
        Category::Internal
    }
}

impl Category {
    /// Only the default target is rendered bold.
    pub fn emphasized(self) -> bool {
        matches!(self, Category::Default)
    }

    /// Short tag a headless view can show in place of an icon.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Default => "default",
            Category::Public => "public",
            Category::Internal => "internal",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
