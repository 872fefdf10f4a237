//! Key scheme for local persistence and remote globs.
//!
//! Local namespaces:
//! - `selectedDoc/{pid}` currently open document path
//! - `doc/{pid}/{path}` document payload
//! - `docs/{pid}` document index
//! - `init/{pid}` last successful remote pull
//!
//! Project ids are escaped so a `/` inside an id cannot reach into another
//! key. Document paths are the last component and need no escaping.

const SELECTED_DOC_PREFIX: &str = "selectedDoc";
const DOC_PREFIX: &str = "doc";
const DOCS_INDEX_PREFIX: &str = "docs";
const INIT_MARKER_PREFIX: &str = "init";

pub fn selected_doc_key(project_id: &str) -> String {
    format!("{SELECTED_DOC_PREFIX}/{}", escape_component(project_id))
}

pub fn doc_key(project_id: &str, path: &str) -> String {
    format!("{DOC_PREFIX}/{}/{path}", escape_component(project_id))
}

pub fn docs_index_key(project_id: &str) -> String {
    format!("{DOCS_INDEX_PREFIX}/{}", escape_component(project_id))
}

pub fn init_marker_key(project_id: &str) -> String {
    format!("{INIT_MARKER_PREFIX}/{}", escape_component(project_id))
}

/// `{account}/document/{pid}/**`: every published document of a project.
pub fn document_glob(account_id: &str, project_id: &str) -> String {
    format!("{account_id}/document/{project_id}/**")
}

/// `{account}/document/{pid}/{path}/**`: one published document.
pub fn document_subtree_glob(account_id: &str, project_id: &str, path: &str) -> String {
    format!("{account_id}/document/{project_id}/{path}/**")
}

/// `{account}/document/{pid}/*/title`: titles of all published documents.
pub fn document_titles_glob(account_id: &str, project_id: &str) -> String {
    format!("{account_id}/document/{project_id}/*/title")
}

pub fn projects_glob(account_id: &str) -> String {
    format!("{account_id}/thing/project/**")
}

pub fn project_glob(account_id: &str, project_id: &str) -> String {
    format!("{account_id}/thing/project/{project_id}/**")
}

fn escape_component(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            other => escaped.push(other),
        }
    }
    escaped
}
