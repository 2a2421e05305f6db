use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A portfolio project loaded from `projects/<id>.md`.
///
/// Frontmatter keys other than `title`, `tags` and `media` are preserved in
/// `extra` and flattened back out when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// Markdown body with the frontmatter stripped.
    pub content: String,
    /// First paragraph of the body, at most 150 chars, followed by `...`.
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form description of the portfolio owner (`about/about.md`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutInfo {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub content: String,
    pub excerpt: String,
}

impl AboutInfo {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// Body of `GET /api/portfolio-data`.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioData {
    pub projects: Vec<Project>,
    pub about: Option<AboutInfo>,
}
