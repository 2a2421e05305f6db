//! Response Normalizer and Fallback Composer.
//!
//! Policy: the model's wording is never shown. A usable generation only signals
//! that an answer is obtainable; the answer itself is rebuilt from the
//! [`RelevantInfo`] record in the fixed markdown layout. Any failure (transport,
//! empty or malformed output, missing fields) degrades to [`compose_fallback`]
//! over the full project list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::assistant::context_builder::{MatchedProject, RelevantInfo};
use crate::assistant::prompts::{first_sentence, OVERVIEW_HEADING};
use crate::llm_client::GenerationError;
use crate::models::portfolio::Project;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").expect("static regex"));
static TEMPLATE_LEFTOVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("static regex"));

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("matched project is missing a {0}")]
    MissingField(&'static str),
}

/// Where the text of an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Generated,
    Fallback,
    Apology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub markdown: String,
    pub source: AnswerSource,
}

/// Turns a generation outcome into the canonical answer. Never fails.
pub fn normalize(
    generated: Result<String, GenerationError>,
    info: &RelevantInfo,
    projects: &[Project],
) -> Rendered {
    let outcome = generated.and_then(|raw| {
        if has_usable_text(&raw) {
            Ok(raw)
        } else {
            Err(GenerationError::EmptyOutput)
        }
    });

    match outcome {
        Ok(_) => match render_overview(info) {
            Ok(markdown) => {
                return Rendered {
                    markdown,
                    source: AnswerSource::Generated,
                }
            }
            Err(e) => warn!("Could not render answer, using fallback: {e}"),
        },
        Err(e) if e.is_malformed() => warn!("Malformed generation, using fallback: {e}"),
        Err(e) => warn!("Generation failed, using fallback: {e}"),
    }

    Rendered {
        markdown: compose_fallback(projects),
        source: AnswerSource::Fallback,
    }
}

/// A generation is usable when it contains at least one alphanumeric char.
fn has_usable_text(raw: &str) -> bool {
    raw.chars().any(char::is_alphanumeric)
}

/// Renders the overview answer from the context record.
pub fn render_overview(info: &RelevantInfo) -> Result<String, NormalizeError> {
    let mut out = format!(
        "{OVERVIEW_HEADING}\n\nWe have {} projects:\n\n",
        info.context.total_projects
    );

    for project in &info.matched_projects {
        out.push_str(&overview_block(project)?);
    }

    out.push_str("---\n\n*Explore further:*\n");
    out.push_str("* Learn more about a specific project\n");
    out.push_str(&format!(
        "* Browse by category: {}\n",
        info.context.available_categories.join(", ")
    ));
    out.push_str(&format!(
        "* View by media type: {}",
        info.context.available_media.join(", ")
    ));

    Ok(out)
}

fn overview_block(project: &MatchedProject) -> Result<String, NormalizeError> {
    if project.title.trim().is_empty() {
        return Err(NormalizeError::MissingField("title"));
    }
    Ok(format!(
        "### {}\n**Media:** {}\n**Tags:** {}\n\n> {}.\n\n",
        project.title,
        project.media,
        project.tags.join(", "),
        sanitize_excerpt(&project.excerpt),
    ))
}

/// Strips HTML tags, markdown links and `{...}` leftovers, then keeps the text
/// before the first period.
pub fn sanitize_excerpt(excerpt: &str) -> String {
    let text = HTML_TAG.replace_all(excerpt, "");
    let text = MARKDOWN_LINK.replace_all(&text, "");
    let text = TEMPLATE_LEFTOVER.replace_all(&text, "");
    first_sentence(&text).trim().to_string()
}

/// Generation-free answer listing every project. Pure: equal input, equal output.
pub fn compose_fallback(projects: &[Project]) -> String {
    let listing = if projects.is_empty() {
        "There are no projects in the portfolio yet.".to_string()
    } else {
        let blocks = projects
            .iter()
            .map(|p| {
                format!(
                    "### {}\n**Type:** {}\n**Tags:** {}",
                    p.title,
                    p.media,
                    p.tags.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("Here are all the projects in our portfolio:\n\n{blocks}")
    };

    format!(
        "{OVERVIEW_HEADING}\n\n{listing}\n\n---\n\n*Please try:*\n\
         * Asking about a specific project listed above\n\
         * Filtering by category\n\
         * Searching by media type"
    )
}
