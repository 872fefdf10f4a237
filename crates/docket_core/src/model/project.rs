//! Project metadata records stored remotely under `thing/project/{pid}`.

use crate::config::CoreConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const UNTITLED_PROJECT: &str = "Untitled";

/// Caller input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: Option<String>,
    pub logo: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Widget source used to render the project's documents.
    pub template: Option<String>,
}

impl ProjectDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Remote record shape: `data`, `template.src` and `type.src`.
    ///
    /// Tags are stored as keys of an object with empty-string values.
    pub fn to_record(&self, config: &CoreConfig) -> Value {
        let tags: Map<String, Value> = self
            .tags
            .iter()
            .map(|tag| (tag.clone(), Value::String(String::new())))
            .collect();
        let title = self
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_PROJECT);
        let template = self
            .template
            .clone()
            .filter(|template| !template.is_empty())
            .unwrap_or_else(|| config.default_template_src());

        json!({
            "data": {
                "title": title,
                "logo": self.logo.clone().unwrap_or_default(),
                "tags": tags,
            },
            "template": { "src": template },
            "type": { "src": config.project_type_src() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectDraft;
    use crate::config::CoreConfig;
    use serde_json::json;

    #[test]
    fn blank_draft_gets_defaults() {
        let config = CoreConfig {
            app_account: "app.near".to_string(),
            ..CoreConfig::default()
        };
        let record = ProjectDraft::default().to_record(&config);
        assert_eq!(
            record,
            json!({
                "data": {"title": "Untitled", "logo": "", "tags": {}},
                "template": {"src": "app.near/widget/templates.project.doc"},
                "type": {"src": "app.near/type/project"}
            })
        );
    }

    #[test]
    fn tags_become_object_keys() {
        let draft = ProjectDraft {
            tags: vec!["rust".to_string(), "docs".to_string()],
            template: Some("me.near/widget/custom".to_string()),
            ..ProjectDraft::titled("Book")
        };
        let record = draft.to_record(&CoreConfig::default());
        assert_eq!(record["data"]["tags"], json!({"rust": "", "docs": ""}));
        assert_eq!(record["template"]["src"], json!("me.near/widget/custom"));
        assert_eq!(record["data"]["title"], json!("Book"));
    }
}
