//! Markdown document parsing: YAML frontmatter split, project/about records, excerpts.
//!
//! Record `content` is the body rendered to HTML. Excerpts come from the raw markdown.

use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Value};

use crate::content::ContentError;
use crate::models::portfolio::{AboutInfo, Project};

/// Excerpts keep at most this many chars of the first paragraph.
pub const EXCERPT_CHARS: usize = 150;

/// A markdown file split into its frontmatter fields and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub fields: Map<String, Value>,
    pub body: String,
}

/// Parses a markdown file with optional `---` delimited YAML frontmatter.
/// A file without frontmatter yields an empty field map and the whole text as body.
pub fn parse_document(text: &str) -> Result<Document, ContentError> {
    let (frontmatter, body) = split_frontmatter(text);

    let fields = match frontmatter {
        Some(fm) if !fm.trim().is_empty() => serde_yaml::from_str::<Map<String, Value>>(fm)?,
        _ => Map::new(),
    };

    Ok(Document {
        fields,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

/// Returns `(Some(frontmatter), body)` or `(None, text)` when no closing delimiter exists.
fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---") else {
        return (None, text);
    };
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// First `\n\n`-separated paragraph, truncated to [`EXCERPT_CHARS`], plus `...`.
pub fn excerpt(body: &str) -> String {
    let first = body.split("\n\n").next().unwrap_or_default();
    let mut out: String = first.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// Renders a markdown body to HTML.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Builds a [`Project`] from a parsed document. `id` is the file stem.
pub fn project_from_document(id: &str, doc: Document) -> Project {
    let Document { mut fields, body } = doc;

    let title = match fields.remove("title") {
        Some(Value::String(s)) => s,
        Some(other) if !other.is_null() => scalar_to_string(&other),
        _ => id.to_string(),
    };
    let tags = match fields.remove("tags") {
        Some(Value::Array(items)) => items.iter().map(scalar_to_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    let media = fields
        .remove("media")
        .filter(|v| !v.is_null())
        .map(|v| scalar_to_string(&v))
        .unwrap_or_default();
    fields.remove("id");

    Project {
        id: id.to_string(),
        title,
        excerpt: excerpt(&body),
        content: render_html(&body),
        tags,
        media,
        extra: fields,
    }
}

pub fn about_from_document(doc: Document) -> AboutInfo {
    AboutInfo {
        excerpt: excerpt(&doc.body),
        fields: doc.fields,
        content: render_html(&doc.body),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
