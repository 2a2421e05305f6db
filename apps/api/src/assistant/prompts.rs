// Prompt text and fixed user-facing strings for the assistant.
// The answer template is a contract: normalizer.rs renders the same layout.

use crate::assistant::context_builder::{MatchedProject, RelevantInfo};

/// Heading every rendered answer starts with.
pub const OVERVIEW_HEADING: &str = "## Portfolio Overview";

/// Shown in place of an answer when even the fallback path fails.
pub const APOLOGY: &str = "I'm sorry, I encountered an error processing your request.";

/// Greeting for a new session. Replace `{assistant_name}`.
pub const WELCOME_TEMPLATE: &str =
    "Hi there! I'm {assistant_name}'s agent. What would you like to find out about?";

/// Answer prompt template.
/// Replace: {assistant_name}, {heading}, {project_count}, {project_blocks},
///          {categories}, {media}, {query}
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"You are {assistant_name}'s portfolio assistant.
ONLY respond with this exact format, replacing text in [brackets]:

{heading}

We have {project_count} projects in our collection:

{project_blocks}

---

*What would you like to know about:*
* Any specific project details
* Browse by category: {categories}
* View by media type: {media}

User query: {query}"#;

pub fn welcome_message(assistant_name: &str) -> String {
    WELCOME_TEMPLATE.replace("{assistant_name}", assistant_name)
}

/// Renders the generation prompt for `query`. The query is substituted last so
/// that braces inside it are never expanded.
pub fn compose_prompt(assistant_name: &str, query: &str, info: &RelevantInfo) -> String {
    let project_blocks = info
        .matched_projects
        .iter()
        .map(project_block)
        .collect::<Vec<_>>()
        .join("\n");

    ANSWER_PROMPT_TEMPLATE
        .replace("{assistant_name}", assistant_name)
        .replace("{heading}", OVERVIEW_HEADING)
        .replace("{project_count}", &info.context.total_projects.to_string())
        .replace("{project_blocks}", &project_blocks)
        .replace("{categories}", &info.context.available_categories.join(", "))
        .replace("{media}", &info.context.available_media.join(", "))
        .replace("{query}", query)
}

fn project_block(project: &MatchedProject) -> String {
    format!(
        "\n### {}\n**Media:** {}\n**Tags:** {}\n\n{}\n",
        project.title,
        project.media,
        project.tags.join(", "),
        first_sentence(&project.excerpt),
    )
}

/// Text before the first period, or the whole string when there is none.
pub fn first_sentence(text: &str) -> &str {
    text.split('.').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::context_builder::build_relevant_info;
    use crate::assistant::test_support::make_project;

    fn info() -> RelevantInfo {
        let mut shop = make_project("Shop", &["React", "Node.js"], "Web", "");
        shop.excerpt = "A storefront. Built in a week....".to_string();
        let zine = make_project("Zine", &["Print"], "Paper", "");
        let all = vec![shop, zine];
        build_relevant_info(&all, &all[..1])
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let prompt = compose_prompt("Studio DATA", "what is Shop?", &info());

        assert!(prompt.starts_with("You are Studio DATA's portfolio assistant."));
        let heading = prompt.find(OVERVIEW_HEADING).unwrap();
        let count = prompt.find("We have 2 projects").unwrap();
        let block = prompt.find("### Shop").unwrap();
        let nav = prompt.find("Browse by category: React, Node.js, Print").unwrap();
        let query = prompt.find("User query: what is Shop?").unwrap();
        assert!(heading < count && count < block && block < nav && nav < query);
        assert!(prompt.ends_with("User query: what is Shop?"));
    }

    #[test]
    fn test_project_block_uses_first_sentence() {
        let prompt = compose_prompt("Studio DATA", "q", &info());
        assert!(prompt.contains("**Media:** Web\n**Tags:** React, Node.js\n\nA storefront\n"));
        assert!(!prompt.contains("Built in a week"));
        assert!(!prompt.contains("### Zine"), "only matched projects get blocks");
        assert!(prompt.contains("View by media type: Web, Paper"));
    }

    #[test]
    fn test_query_braces_not_expanded() {
        let prompt = compose_prompt("Studio DATA", "{categories}", &info());
        assert!(prompt.ends_with("User query: {categories}"));
    }

    #[test]
    fn test_first_sentence() {
        assert_eq!(first_sentence("One. Two."), "One");
        assert_eq!(first_sentence("No period"), "No period");
        assert_eq!(first_sentence(""), "");
    }

    #[test]
    fn test_welcome_names_assistant() {
        assert_eq!(
            welcome_message("Studio DATA"),
            "Hi there! I'm Studio DATA's agent. What would you like to find out about?"
        );
    }
}
