use regex::Regex;
use serde::Serialize;

/// Where a `<target>` start tag sits in descriptor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetLocation {
    /// Byte offset of the match.
    pub offset: usize,
    /// Byte length of the match.
    pub len: usize,
    /// 1-based.
    pub line: usize,
    /// 1-based, in characters.
    pub column: usize,
}

/// Finds the first `<target ... name="NAME" ...>` tag for `name`.
///
/// # Example
/// ```
/// use ant_e::locate_target;
///
/// let text = "<project>\n  <target name=\"dist\" depends=\"jar\">\n</project>";
/// let loc = locate_target(text, "dist").unwrap();
/// assert_eq!((loc.line, loc.column), (2, 3));
/// ```
pub fn locate_target(text: &str, name: &str) -> Option<TargetLocation> {
    let pattern = format!(
        r#"<target[^>]+name\s*=\s*"{}".*>"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let found = re.find(text)?;

    let before = &text[..found.start()];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = text[line_start..found.start()].chars().count() + 1;

    Some(TargetLocation {
        offset: found.start(),
        len: found.len(),
        line,
        column,
    })
}
