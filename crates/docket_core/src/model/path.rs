//! Dot-separated document paths.
//!
//! The empty path is the project's root document. Direct children of the
//! root have single-segment paths without a leading separator.

/// Separator between path segments.
pub const DOC_SEPARATOR: &str = ".";

/// Path of the project's root document.
pub const ROOT_PATH: &str = "";

/// Joins `parent_path` and `segment`, omitting the separator under the root.
pub fn child_path(parent_path: &str, segment: &str) -> String {
    if parent_path.is_empty() {
        segment.to_string()
    } else {
        format!("{parent_path}{DOC_SEPARATOR}{segment}")
    }
}

/// Splits a path into its segments. The root path has one empty segment.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(DOC_SEPARATOR).collect()
}

/// Whether `descendant` lies strictly below `ancestor` in the tree.
///
/// Every non-root path descends from the root path.
pub fn is_descendant_of(descendant: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !descendant.is_empty();
    }
    descendant.len() > ancestor.len() + DOC_SEPARATOR.len()
        && descendant.starts_with(ancestor)
        && descendant[ancestor.len()..].starts_with(DOC_SEPARATOR)
}
