//! Chat session — owns one visitor's conversation memory and runs the
//! per-query pipeline:
//!
//! record user turn → load projects → select (rank or enumerate) →
//! build context → compose prompt → generate → normalize → record answer.
//!
//! Every query yields an answer. Only the content load can fail hard, and that
//! produces the fixed apology instead of an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::context_builder::build_relevant_info;
use crate::assistant::memory::{ConversationMemory, ConversationTurn, MEMORY_CAPACITY};
use crate::assistant::normalizer::{compose_fallback, normalize, AnswerSource, Rendered};
use crate::assistant::prompts::{compose_prompt, APOLOGY};
use crate::assistant::ranker::{select_projects, RankerConfig};
use crate::content::ContentStore;
use crate::llm_client::{GenerationError, GenerationOptions, TextGenerator};

/// Pipeline settings shared by all sessions.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub assistant_name: String,
    pub ranker: RankerConfig,
    pub generation: GenerationOptions,
    /// Overall deadline for one generation call, retries included.
    pub generation_timeout: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            assistant_name: "Studio DATA".to_string(),
            ranker: RankerConfig::default(),
            generation: GenerationOptions::default(),
            generation_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
    pub matched_projects: usize,
}

#[derive(Debug)]
pub struct ChatSession {
    pub id: Uuid,
    memory: ConversationMemory,
}

impl ChatSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            memory: ConversationMemory::default(),
        }
    }

    #[cfg(test)]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answers one visitor message and records both turns.
    ///
    /// Memory is only touched once the answer exists, so a request dropped
    /// mid-generation leaves no unanswered user turn behind.
    pub async fn respond(
        &mut self,
        message: &str,
        store: &Arc<ContentStore>,
        generator: &dyn TextGenerator,
        settings: &AssistantSettings,
    ) -> Answer {
        let answer = self.answer(message, store, generator, settings).await;

        self.memory.append(ConversationTurn::user(message));
        self.memory
            .append(ConversationTurn::assistant(answer.text.clone()));
        answer
    }

    async fn answer(
        &self,
        message: &str,
        store: &Arc<ContentStore>,
        generator: &dyn TextGenerator,
        settings: &AssistantSettings,
    ) -> Answer {
        let projects = match store.list_projects_blocking().await {
            Ok(projects) => projects,
            Err(e) => {
                warn!("Session {}: content unavailable mid-conversation: {e}", self.id);
                return Answer {
                    text: APOLOGY.to_string(),
                    source: AnswerSource::Apology,
                    matched_projects: 0,
                };
            }
        };

        // The current query counts as the newest turn.
        let mut recent = self.memory.recent(MEMORY_CAPACITY - 1);
        recent.push(ConversationTurn::user(message));

        let selection = select_projects(message, &projects, &recent, &settings.ranker);
        let info = build_relevant_info(&projects, &selection.projects);
        info!(
            "Session {}: selected {}/{} projects (enumerated: {})",
            self.id,
            info.matched_projects.len(),
            projects.len(),
            selection.enumerated
        );

        let rendered = if info.matched_projects.is_empty() {
            info!("Session {}: no project matched, answering with fallback", self.id);
            Rendered {
                markdown: compose_fallback(&projects),
                source: AnswerSource::Fallback,
            }
        } else {
            let prompt = compose_prompt(&settings.assistant_name, message, &info);
            debug!("Session {}: prompt composed ({} chars)", self.id, prompt.len());

            let generated = generate_with_deadline(generator, &prompt, settings).await;
            normalize(generated, &info, &projects)
        };

        Answer {
            text: rendered.markdown,
            source: rendered.source,
            matched_projects: info.matched_projects.len(),
        }
    }
}

async fn generate_with_deadline(
    generator: &dyn TextGenerator,
    prompt: &str,
    settings: &AssistantSettings,
) -> Result<String, GenerationError> {
    tokio::time::timeout(
        settings.generation_timeout,
        generator.generate(prompt, &settings.generation),
    )
    .await
    .unwrap_or(Err(GenerationError::Timeout(settings.generation_timeout)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::prompts::OVERVIEW_HEADING;
    use crate::assistant::test_support::ScriptedGenerator;
    use crate::content::tests::content_dir;

    const SHOP: &str = "---\ntitle: Shop\ntags: [React, Node.js]\nmedia: Web\n---\nAn online <b>store</b>. Fast.";
    const BLOG: &str = "---\ntitle: Blog\ntags: [Next.js]\nmedia: Web\n---\nPosts on typography.";
    const ZINE: &str = "---\ntitle: Zine\ntags: [Print]\nmedia: Paper\n---\nA folded booklet.";

    fn store(dir: &tempfile::TempDir) -> Arc<ContentStore> {
        Arc::new(ContentStore::new(dir.path(), Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_enumeration_answer_lists_all_projects_in_order() {
        let dir = content_dir(&[("a-shop", SHOP), ("b-blog", BLOG), ("c-zine", ZINE)], None);
        let generator = ScriptedGenerator::ok("some text");
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond(
                "how many projects do you have",
                &store(&dir),
                &generator,
                &AssistantSettings::default(),
            )
            .await;

        assert_eq!(answer.source, AnswerSource::Generated);
        assert_eq!(answer.matched_projects, 3);
        let shop = answer.text.find("### Shop").unwrap();
        let blog = answer.text.find("### Blog").unwrap();
        let zine = answer.text.find("### Zine").unwrap();
        assert!(shop < blog && blog < zine);
        assert!(answer.text.contains("We have 3 projects:"));
        assert!(answer.text.contains("> An online store."));
    }

    #[tokio::test]
    async fn test_ranked_answer_excludes_unmatched() {
        let dir = content_dir(&[("a-shop", SHOP), ("b-blog", BLOG)], None);
        let generator = ScriptedGenerator::ok("text");
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond(
                "tell me about your React work",
                &store(&dir),
                &generator,
                &AssistantSettings::default(),
            )
            .await;

        assert_eq!(answer.matched_projects, 1);
        assert!(answer.text.contains("### Shop"));
        assert!(!answer.text.contains("### Blog"));
        assert!(generator.last_prompt().unwrap().ends_with("User query: tell me about your React work"));
    }

    #[tokio::test]
    async fn test_generation_error_yields_fallback_and_records_turns() {
        let dir = content_dir(&[("a-shop", SHOP), ("b-blog", BLOG)], None);
        let generator = ScriptedGenerator::failing();
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond("react", &store(&dir), &generator, &AssistantSettings::default())
            .await;

        assert_eq!(answer.source, AnswerSource::Fallback);
        assert!(answer.text.starts_with(OVERVIEW_HEADING));
        assert!(answer.text.contains("---"));

        let turns = session.memory().recent(MEMORY_CAPACITY);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::user("react"));
        assert_eq!(turns[1].content, answer.text);
    }

    #[tokio::test]
    async fn test_no_match_skips_generation() {
        let dir = content_dir(&[("a-shop", SHOP)], None);
        let generator = ScriptedGenerator::ok("text");
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond("zzzz", &store(&dir), &generator, &AssistantSettings::default())
            .await;

        assert_eq!(answer.source, AnswerSource::Fallback);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_content_failure_records_apology() {
        let dir = content_dir(&[("bad", "---\ntitle: [broken\n---\n")], None);
        let generator = ScriptedGenerator::ok("text");
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond("anything", &store(&dir), &generator, &AssistantSettings::default())
            .await;

        assert_eq!(answer.source, AnswerSource::Apology);
        assert_eq!(answer.text, APOLOGY);
        assert_eq!(
            session.memory().last(),
            Some(&ConversationTurn::assistant(APOLOGY))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_generation_times_out_to_fallback() {
        let dir = content_dir(&[("a-shop", SHOP)], None);
        let generator = ScriptedGenerator::ok("late").with_delay(Duration::from_secs(120));
        let settings = AssistantSettings {
            generation_timeout: Duration::from_secs(5),
            ..AssistantSettings::default()
        };
        let mut session = ChatSession::new(Uuid::new_v4());

        let answer = session
            .respond("shop", &store(&dir), &generator, &settings)
            .await;

        assert_eq!(answer.source, AnswerSource::Fallback);
    }

    #[tokio::test]
    async fn test_memory_stays_bounded_across_queries() {
        let dir = content_dir(&[("a-shop", SHOP)], None);
        let generator = ScriptedGenerator::ok("text");
        let mut session = ChatSession::new(Uuid::new_v4());
        let store = store(&dir);

        for i in 0..5 {
            session
                .respond(&format!("shop {i}"), &store, &generator, &AssistantSettings::default())
                .await;
        }
        assert_eq!(session.memory().len(), MEMORY_CAPACITY);
        assert_eq!(
            session.memory().recent(MEMORY_CAPACITY)[4],
            ConversationTurn::user("shop 4")
        );
    }

    #[tokio::test]
    async fn test_dropped_request_leaves_memory_untouched() {
        let dir = content_dir(&[("a-shop", SHOP)], None);
        let slow = ScriptedGenerator::ok("late").with_delay(Duration::from_secs(30));
        let mut session = ChatSession::new(Uuid::new_v4());
        let store = store(&dir);
        let settings = AssistantSettings::default();

        let dropped = tokio::time::timeout(
            Duration::from_millis(200),
            session.respond("shop", &store, &slow, &settings),
        )
        .await;
        assert!(dropped.is_err());
        assert!(session.memory().is_empty());

        let answer = session
            .respond("shop", &store, &ScriptedGenerator::ok("text"), &settings)
            .await;
        let turns = session.memory().recent(MEMORY_CAPACITY);
        assert_eq!(
            turns,
            vec![
                ConversationTurn::user("shop"),
                ConversationTurn::assistant(answer.text)
            ]
        );
    }
}
