// Portfolio assistant: turns a visitor question into a grounded markdown answer.
// All generation goes through llm_client::TextGenerator; everything else here is
// synchronous and pure apart from the session's own memory.

pub mod context_builder;
pub mod handlers;
pub mod memory;
pub mod normalizer;
pub mod prompts;
pub mod ranker;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Map;

    use crate::llm_client::{GenerationError, GenerationOptions, TextGenerator};
    use crate::models::portfolio::Project;

    pub(crate) fn make_project(title: &str, tags: &[&str], media: &str, content: &str) -> Project {
        Project {
            id: title.to_lowercase(),
            title: title.to_string(),
            content: content.to_string(),
            excerpt: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            media: media.to_string(),
            extra: Map::new(),
        }
    }

    /// Test double that returns a fixed reply (or an error) and records prompts.
    pub(crate) struct ScriptedGenerator {
        reply: Option<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn ok(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                ..Self::ok("")
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().ok_or(GenerationError::RetriesExhausted { retries: 3 })
        }
    }
}
