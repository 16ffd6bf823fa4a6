//! In-memory stand-ins for the vector store and the language model.

use crate::pipeline::{Capabilities, Pipeline, PipelineSettings};
use crate::retrieval::SimilaritySearch;
use crate::types::Passage;
use comai_core::{AppConfig, AppError, AppResult};
use comai_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Marker present only in the follow-up prompt.
const FOLLOW_UP_MARKER: &str = "Follow-up Questions:";

pub(crate) const MODEL_FOLLOW_UPS: [&str; 3] = [
    "Which industries do you work with?",
    "How long does a website project take?",
    "Do you offer ongoing support?",
];

/// Search returning a fixed passage list, or failing.
pub(crate) struct FakeSearch {
    passages: AppResult<Vec<Passage>>,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub(crate) fn returning(passages: Vec<Passage>) -> Self {
        Self {
            passages: Ok(passages),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            passages: Err(AppError::Retrieval("connection refused".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SimilaritySearch for FakeSearch {
    async fn search(&self, _query: &str) -> AppResult<Vec<Passage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.passages {
            Ok(passages) => Ok(passages.clone()),
            Err(e) => Err(AppError::Retrieval(e.to_string())),
        }
    }
}

/// Scripted LLM. Answer and follow-up prompts are told apart by the
/// follow-up template's trailing marker.
pub(crate) struct FakeLlm {
    answer: Option<String>,
    follow_ups: Option<String>,
    answer_delay: Duration,
    requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlm {
    pub(crate) fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            follow_ups: Some(
                serde_json::to_string(&MODEL_FOLLOW_UPS).unwrap_or_default(),
            ),
            answer_delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every completion.
    pub(crate) fn failing() -> Self {
        Self {
            answer: None,
            follow_ups: None,
            answer_delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_follow_ups(mut self, raw: &str) -> Self {
        self.follow_ups = Some(raw.to_string());
        self
    }

    pub(crate) fn with_failing_follow_ups(mut self) -> Self {
        self.follow_ups = None;
        self
    }

    /// Hold every answer call for `delay` before replying.
    pub(crate) fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = delay;
        self
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let scripted = if request.prompt.contains(FOLLOW_UP_MARKER) {
            &self.follow_ups
        } else {
            if !self.answer_delay.is_zero() {
                tokio::time::sleep(self.answer_delay).await;
            }
            &self.answer
        };

        match scripted {
            Some(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            None => Err(AppError::Llm("upstream returned 503".to_string())),
        }
    }
}

/// Pipeline over the fakes with default settings and no token pacing.
pub(crate) fn pipeline(search: Arc<FakeSearch>, llm: Arc<FakeLlm>) -> Pipeline {
    let mut settings = PipelineSettings::from_config(&AppConfig::default()).unwrap();
    settings.token_delay = Duration::ZERO;
    pipeline_with(search, llm, settings)
}

pub(crate) fn pipeline_with(
    search: Arc<FakeSearch>,
    llm: Arc<FakeLlm>,
    settings: PipelineSettings,
) -> Pipeline {
    Pipeline::new(Capabilities { search, llm }, settings)
}
