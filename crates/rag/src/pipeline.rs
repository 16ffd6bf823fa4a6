//! The query pipeline.
//!
//! A linear state machine:
//!
//! ```text
//! Start -> Classified -> Retrieved -> Generated -> Deduped -> FollowedUp -> Done
//!              |              \___________/
//!              v                    v
//!            Done (casual)        Failed (degraded answer)
//! ```
//!
//! Each call to [`Pipeline::run`] is independent. The only shared state is
//! the read-only capability bundle built at startup.

use crate::classifier::{Classification, QueryClassifier};
use crate::followup::FollowUpGenerator;
use crate::generator::AnswerGenerator;
use crate::retrieval::{Retriever, SimilaritySearch};
use crate::sources::dedupe_sources;
use crate::types::{MemoryContext, Question, RagResult};
use comai_core::config::{CasualPhrase, Sampling};
use comai_core::{AppConfig, AppError, AppResult};
use comai_llm::LlmClient;
use comai_prompt::{resolve_prompt, PromptDefinition, ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline progress, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Classified,
    Retrieved,
    Generated,
    Deduped,
    FollowedUp,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Classified => "classified",
            Stage::Retrieved => "retrieved",
            Stage::Generated => "generated",
            Stage::Deduped => "deduped",
            Stage::FollowedUp => "followed_up",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Independently toggleable pipeline features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Pass conversation memory into the answer prompt
    pub memory_context: bool,
    /// Generate follow-up suggestions
    pub follow_ups: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            memory_context: true,
            follow_ups: true,
        }
    }
}

/// External capabilities the pipeline depends on.
#[derive(Clone)]
pub struct Capabilities {
    pub search: Arc<dyn SimilaritySearch>,
    pub llm: Arc<dyn LlmClient>,
}

/// Everything besides the capabilities needed to build a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub answer_sampling: Sampling,
    pub follow_up_sampling: Sampling,
    pub answer_prompt: PromptDefinition,
    pub follow_up_prompt: PromptDefinition,
    pub casual: Vec<CasualPhrase>,
    pub options: PipelineOptions,
    pub token_delay: Duration,
}

impl PipelineSettings {
    /// Resolve prompts (directory overrides or built-ins) and copy the
    /// relevant configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let prompts_dir = config.prompts_dir();
        let answer_prompt = resolve_prompt(prompts_dir.as_deref(), ANSWER_PROMPT_ID)?;
        let follow_up_prompt = resolve_prompt(prompts_dir.as_deref(), FOLLOW_UP_PROMPT_ID)?;

        Ok(Self {
            model: config.llm.model.clone(),
            answer_sampling: config.llm.answer,
            follow_up_sampling: config.llm.follow_up,
            answer_prompt,
            follow_up_prompt,
            casual: config.casual.clone(),
            options: PipelineOptions {
                memory_context: config.pipeline.memory_context,
                follow_ups: config.pipeline.follow_ups,
            },
            token_delay: Duration::from_millis(config.pipeline.token_delay_ms),
        })
    }
}

/// Classifier, retriever, generator and follow-up generator wired together.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<QueryClassifier>,
    retriever: Retriever,
    generator: AnswerGenerator,
    follow_ups: FollowUpGenerator,
    options: PipelineOptions,
    token_delay: Duration,
}

impl Pipeline {
    pub fn new(capabilities: Capabilities, settings: PipelineSettings) -> Self {
        let classifier = Arc::new(QueryClassifier::new(&settings.casual));

        let generator = AnswerGenerator::new(
            capabilities.llm.clone(),
            settings.model.clone(),
            settings.answer_sampling,
            settings.answer_prompt,
        );

        let follow_ups = FollowUpGenerator::new(
            capabilities.llm,
            settings.model,
            settings.follow_up_sampling,
            settings.follow_up_prompt,
            classifier.clone(),
        );

        Self {
            classifier,
            retriever: Retriever::new(capabilities.search),
            generator,
            follow_ups,
            options: settings.options,
            token_delay: settings.token_delay,
        }
    }

    /// Per-character pacing for streamed answers.
    pub fn token_delay(&self) -> Duration {
        self.token_delay
    }

    /// Answer a question.
    ///
    /// Never fails: retrieval and generation errors are logged and replaced
    /// by the degraded result.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, question: &Question, memory: &MemoryContext) -> RagResult {
        tracing::debug!(stage = %Stage::Start, "Processing question");

        let reply = match self.classifier.classify(question.as_str()) {
            Classification::Casual(reply) => Some(reply.to_string()),
            Classification::Substantive => None,
        };
        tracing::debug!(stage = %Stage::Classified, casual = reply.is_some());

        if let Some(reply) = reply {
            tracing::debug!(stage = %Stage::Done, "Answered casual question");
            return RagResult::casual(question, &reply);
        }

        match self.answer(question, memory).await {
            Ok(result) => {
                tracing::debug!(stage = %Stage::Done, sources = result.sources().len());
                result
            }
            Err((stage, e)) => {
                tracing::error!(after_stage = %stage, error = %e, "Pipeline failed");
                tracing::debug!(stage = %Stage::Failed);
                RagResult::degraded(question)
            }
        }
    }

    /// Substantive path. Errors carry the last stage reached.
    async fn answer(
        &self,
        question: &Question,
        memory: &MemoryContext,
    ) -> Result<RagResult, (Stage, AppError)> {
        let passages = self
            .retriever
            .retrieve(question.as_str())
            .await
            .map_err(|e| (Stage::Classified, e))?;
        tracing::debug!(stage = %Stage::Retrieved, passages = passages.len());

        let empty = MemoryContext::default();
        let memory = if self.options.memory_context {
            memory
        } else {
            &empty
        };

        let answer = self
            .generator
            .generate(question, &passages, memory)
            .await
            .map_err(|e| (Stage::Retrieved, e))?;
        tracing::debug!(stage = %Stage::Generated, chars = answer.chars().count());

        let sources = dedupe_sources(&passages);
        tracing::debug!(stage = %Stage::Deduped, sources = sources.len());

        let follow_ups = if self.options.follow_ups {
            self.follow_ups.suggest(question, &answer).await
        } else {
            Vec::new()
        };
        tracing::debug!(stage = %Stage::FollowedUp, follow_ups = follow_ups.len());

        Ok(RagResult::new(question, answer, sources, follow_ups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::FollowedUp.to_string(), "followed_up");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }

    #[tokio::test]
    async fn test_failure_reports_last_stage_reached() {
        use crate::tests::fakes::{pipeline, FakeLlm, FakeSearch};
        use crate::types::Passage;

        let question = Question::parse("What services do you offer?").unwrap();
        let memory = MemoryContext::default();

        let no_search = pipeline(
            Arc::new(FakeSearch::failing()),
            Arc::new(FakeLlm::answering("unused")),
        );
        match no_search.answer(&question, &memory).await {
            Err((stage, AppError::Retrieval(_))) => assert_eq!(stage, Stage::Classified),
            _ => panic!("expected retrieval failure"),
        }

        let no_llm = pipeline(
            Arc::new(FakeSearch::returning(vec![Passage::new("text", "docs/a.md")])),
            Arc::new(FakeLlm::failing()),
        );
        match no_llm.answer(&question, &memory).await {
            Err((stage, AppError::Llm(_))) => assert_eq!(stage, Stage::Retrieved),
            _ => panic!("expected generation failure"),
        }
    }

    #[test]
    fn test_settings_from_default_config() {
        let config = AppConfig::default();
        let settings = PipelineSettings::from_config(&config).unwrap();

        assert_eq!(settings.model, config.llm.model);
        assert_eq!(settings.answer_prompt.id, ANSWER_PROMPT_ID);
        assert_eq!(settings.follow_up_prompt.id, FOLLOW_UP_PROMPT_ID);
        assert_eq!(settings.options, PipelineOptions::default());
        assert_eq!(settings.token_delay, Duration::from_millis(2));
        assert_eq!(settings.casual.len(), config.casual.len());
    }

    #[test]
    fn test_settings_missing_prompt_dir_falls_back_to_builtins() {
        let mut config = AppConfig::default();
        config.pipeline.prompts_dir = Some("/nonexistent/prompts".into());
        config.pipeline.follow_ups = false;

        let settings = PipelineSettings::from_config(&config).unwrap();
        assert_eq!(settings.answer_prompt.id, ANSWER_PROMPT_ID);
        assert!(!settings.options.follow_ups);
    }

    #[test]
    fn test_settings_prefer_prompt_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.answer.yml"),
            "id: rag.answer\ntitle: Terse\napiVersion: \"1.0\"\nvariables: [context, question]\ntemplate: \"{{context}} / {{question}}\"\noutput:\n  format: text\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.pipeline.prompts_dir = Some(dir.path().to_path_buf());

        let settings = PipelineSettings::from_config(&config).unwrap();
        assert_eq!(settings.answer_prompt.title, "Terse");
        assert_eq!(settings.follow_up_prompt.id, FOLLOW_UP_PROMPT_ID);
    }
}
