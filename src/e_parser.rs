use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{BuildFile, Target};

/// Failure to turn a descriptor on disk into a [`BuildFile`].
///
/// A refresh treats every variant as "skip this file", never as fatal.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
    #[error("{} is not well-formed XML: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

impl ParseError {
    pub fn path(&self) -> &Path {
        match self {
            ParseError::Io { path, .. }
            | ParseError::Encoding { path }
            | ParseError::Xml { path, .. } => path,
        }
    }
}

/// Reads and parses the build descriptor at `path`.
///
/// Existence is the caller's concern; a missing file surfaces as [`ParseError::Io`].
pub fn parse(path: &Path) -> Result<BuildFile, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        path: path.to_path_buf(),
    })?;
    parse_str(path, &text)
}

/// Parses descriptor text already in memory; `path` becomes the [`BuildFile`]'s key.
///
/// # Example
/// ```
/// use std::path::Path;
/// use ant_e::{parse_str, Category};
///
/// let xml = r#"<project name="P" default="run">
///     <target name="run" description="Runs it"/>
///     <target name="clean"/>
/// </project>"#;
/// let file = parse_str(Path::new("/tmp/build.xml"), xml).unwrap();
/// assert_eq!(file.project_name, "P");
/// assert_eq!(file.targets[0].category, Category::Default);
/// assert_eq!(file.targets[1].category, Category::Internal);
/// ```
pub fn parse_str(path: &Path, text: &str) -> Result<BuildFile, ParseError> {
    let xml_error = |source: roxmltree::Error| ParseError::Xml {
        path: path.to_path_buf(),
        source,
    };

    // First pass records the SYSTEM entities the document references.
    let requested = RefCell::new(Vec::new());
    let unresolved = HashMap::new();
    {
        let resolver =
            |public_id: Option<&str>, uri: &str| resolve_entity(&unresolved, &requested, public_id, uri);
        let doc = parse_document(text, &resolver).map_err(xml_error)?;
        if requested.borrow().is_empty() {
            return Ok(build_file(path, &doc));
        }
    }

    let entities = load_entities(path, &requested.borrow());
    let resolver =
        |public_id: Option<&str>, uri: &str| resolve_entity(&entities, &requested, public_id, uri);
    let doc = parse_document(text, &resolver).map_err(xml_error)?;
    Ok(build_file(path, &doc))
}

fn parse_document<'i, F>(text: &'i str, resolver: &'i F) -> Result<Document<'i>, roxmltree::Error>
where
    F: Fn(Option<&str>, &str) -> Result<Option<&'i str>, String> + 'i,
{
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    options.entity_resolver = Some(resolver);
    Document::parse_with_options(text, options)
}

/// Serves external entities from `entities`; anything not loaded expands to nothing.
fn resolve_entity<'i>(
    entities: &'i HashMap<String, String>,
    requested: &RefCell<Vec<String>>,
    _public_id: Option<&str>,
    uri: &str,
) -> Result<Option<&'i str>, String> {
    if !requested.borrow().iter().any(|known| known == uri) {
        requested.borrow_mut().push(uri.to_string());
    }
    Ok(Some(entities.get(uri).map(String::as_str).unwrap_or("")))
}

/// Reads entity files relative to the descriptor's directory.
fn load_entities(path: &Path, uris: &[String]) -> HashMap<String, String> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut entities = HashMap::new();
    for uri in uris {
        let file = base.join(uri.strip_prefix("file:").unwrap_or(uri));
        match fs::read_to_string(&file) {
            Ok(text) => {
                entities.insert(uri.clone(), strip_text_declaration(&text).to_string());
            }
            Err(e) => warn!(
                path = %path.display(),
                entity = %file.display(),
                "cannot read external entity, treating it as empty: {}",
                e
            ),
        }
    }
    entities
}

fn strip_text_declaration(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map_or(trimmed, |end| &rest[end + 2..]),
        None => text,
    }
}

fn build_file(path: &Path, doc: &Document<'_>) -> BuildFile {
    let project = doc.root_element();
    if project.tag_name().name() != "project" {
        debug!(
            path = %path.display(),
            root = project.tag_name().name(),
            "descriptor root is not <project>"
        );
    }

    let project_name = match project.attribute("name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => path.display().to_string(),
    };
    let default_target_name = attr_or_empty(project, "default");
    let description = attr_or_empty(project, "description");

    let targets = project
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == "target")
        .map(|child| {
            Target::new(
                attr_or_empty(child, "name"),
                attr_or_empty(child, "description"),
                &default_target_name,
            )
        })
        .collect::<Vec<_>>();

    debug!(
        path = %path.display(),
        targets = targets.len(),
        "parsed descriptor"
    );

    BuildFile {
        path: path.to_path_buf(),
        project_name,
        description,
        default_target_name,
        targets,
    }
}

fn attr_or_empty(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    fn p() -> &'static Path {
        Path::new("/work/build.xml")
    }

    #[test]
    fn scenario_descriptor() {
        let xml = r#"<project name="P" default="run"><target name="run" description="Runs it"/><target name="clean"/></project>"#;
        let file = parse_str(p(), xml).unwrap();
        assert_eq!(file.project_name, "P");
        assert_eq!(file.default_target_name, "run");
        assert_eq!(file.targets.len(), 2);
        assert_eq!(file.targets[0].name, "run");
        assert_eq!(file.targets[0].category, Category::Default);
        assert_eq!(file.targets[1].name, "clean");
        assert_eq!(file.targets[1].category, Category::Internal);
    }

    #[test]
    fn missing_or_empty_name_falls_back_to_path() {
        let file = parse_str(p(), "<project/>").unwrap();
        assert_eq!(file.project_name, "/work/build.xml");
        assert_eq!(file.default_target_name, "");
        assert!(file.targets.is_empty());

        let file = parse_str(p(), r#"<project name=""/>"#).unwrap();
        assert_eq!(file.project_name, "/work/build.xml");
    }

    #[test]
    fn only_direct_target_children_count() {
        let xml = r#"<?xml version="1.0"?>
<!-- leading comment -->
<project name="X" description="The X project">
    <property name="src" value="src"/>
    <target name="a" description="A">
        <target name="nested"/>
    </target>
    <macrodef name="m"/>
    <target description="anonymous"/>
</project>"#;
        let file = parse_str(p(), xml).unwrap();
        assert_eq!(file.description, "The X project");
        let names: Vec<_> = file.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", ""]);
        assert_eq!(file.targets[1].category, Category::Public);
    }

    #[test]
    fn doctype_is_accepted() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE project [ <!ENTITY common "common"> ]>
<project name="D" default="all"><target name="all"/></project>"#;
        let file = parse_str(p(), xml).unwrap();
        assert_eq!(file.targets[0].category, Category::Default);
    }

    #[test]
    fn system_entity_is_included_from_the_descriptor_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("common.xml"),
            "<?xml version=\"1.0\"?>\n<target name=\"shared\" description=\"From common\"/>\n",
        )
        .unwrap();
        let build = dir.path().join("build.xml");
        fs::write(
            &build,
            r#"<!DOCTYPE project [ <!ENTITY common SYSTEM "common.xml"> ]>
<project name="E" default="t">&common;<target name="t"/></project>"#,
        )
        .unwrap();

        let file = parse(&build).unwrap();
        let names: Vec<_> = file.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "t"]);
        assert_eq!(file.targets[0].category, Category::Public);
        assert_eq!(file.targets[1].category, Category::Default);
    }

    #[test]
    fn unreadable_entity_expands_to_nothing() {
        let xml = r#"<!DOCTYPE project [ <!ENTITY common SYSTEM "common.xml"> ]><project name="E">&common;<target name="t"/></project>"#;
        let file = parse_str(Path::new("/definitely/not/here/build.xml"), xml).unwrap();
        assert_eq!(file.project_name, "E");
        assert_eq!(file.targets.len(), 1);
        assert_eq!(file.targets[0].name, "t");
    }

    #[test]
    fn non_utf8_file_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build.xml");
        fs::write(&build, [b'<', b'p', b'r', b'o', b'j', b'e', b'c', b't', 0xff, 0xfe, b'/', b'>']).unwrap();
        let err = parse(&build).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { .. }));
        assert_eq!(err.path(), build.as_path());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = parse_str(p(), "<project><target name='a'></project>").unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
        assert_eq!(err.path(), p());
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = parse(Path::new("/definitely/not/here/build.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
