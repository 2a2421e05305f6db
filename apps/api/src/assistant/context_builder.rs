//! Context Builder — turns a project selection into the record that feeds both
//! the prompt and the rendered answer.

use serde::Serialize;

use crate::models::portfolio::Project;

/// Facets computed from the whole store, independent of what matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioContext {
    pub total_projects: usize,
    /// Union of all project tags, first-seen order, no duplicates.
    pub available_categories: Vec<String>,
    /// Union of all project media, first-seen order, no duplicates.
    pub available_media: Vec<String>,
}

/// The projection of a [`Project`] that the prompt and answer are allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedProject {
    pub title: String,
    pub tags: Vec<String>,
    pub media: String,
    pub excerpt: String,
}

impl From<&Project> for MatchedProject {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            tags: project.tags.clone(),
            media: project.media.clone(),
            excerpt: project.excerpt.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantInfo {
    pub context: PortfolioContext,
    pub matched_projects: Vec<MatchedProject>,
}

/// Builds the context record for one query.
///
/// `all_projects` is the full store snapshot; `selected` is the ranker's output
/// (or every project for enumeration queries) and keeps its order.
pub fn build_relevant_info(all_projects: &[Project], selected: &[Project]) -> RelevantInfo {
    let context = PortfolioContext {
        total_projects: all_projects.len(),
        available_categories: unique_in_order(
            all_projects.iter().flat_map(|p| p.tags.iter()),
        ),
        available_media: unique_in_order(all_projects.iter().map(|p| &p.media)),
    };

    RelevantInfo {
        context,
        matched_projects: selected.iter().map(MatchedProject::from).collect(),
    }
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::test_support::make_project;

    fn store() -> Vec<Project> {
        vec![
            make_project("Shop", &["React", "Node.js"], "Web", ""),
            make_project("Blog", &["Next.js", "React"], "Web", ""),
            make_project("Zine", &["Print"], "Paper", ""),
        ]
    }

    #[test]
    fn test_facets_cover_full_store_regardless_of_match() {
        let all = store();
        let info = build_relevant_info(&all, &all[2..]);

        assert_eq!(info.context.total_projects, 3);
        assert_eq!(
            info.context.available_categories,
            vec!["React", "Node.js", "Next.js", "Print"]
        );
        assert_eq!(info.context.available_media, vec!["Web", "Paper"]);
        assert_eq!(info.matched_projects.len(), 1);
        assert_eq!(info.matched_projects[0].title, "Zine");
    }

    #[test]
    fn test_matched_projects_keep_selection_order() {
        let all = store();
        let selected = vec![all[2].clone(), all[0].clone()];
        let info = build_relevant_info(&all, &selected);
        let titles: Vec<_> = info.matched_projects.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Zine", "Shop"]);
    }

    #[test]
    fn test_empty_store() {
        let info = build_relevant_info(&[], &[]);
        assert_eq!(info.context.total_projects, 0);
        assert!(info.context.available_categories.is_empty());
        assert!(info.matched_projects.is_empty());
    }

    #[test]
    fn test_blank_media_not_offered() {
        let all = vec![make_project("Untitled", &[], "", "")];
        let info = build_relevant_info(&all, &all);
        assert!(info.context.available_media.is_empty());
    }
}
