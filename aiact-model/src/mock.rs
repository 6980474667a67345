//! Scripted generation provider for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use aiact_core::{GenerationProvider, GenerationRequest, ModelError, Result};
use async_trait::async_trait;
use tracing::debug;

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync>;

/// A [`GenerationProvider`] that answers from a script.
///
/// Queued responses are returned first, in order. Once the queue is empty the
/// responder closure (if any) answers; with neither, calls fail with a
/// transport error. Every request is recorded so tests can inspect prompts.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_model::MockLlm;
///
/// let llm = MockLlm::new("mock")
///     .with_response(r#"{"accuracy_score": 0.9, ...}"#)
///     .with_delay(Duration::from_millis(50));
/// ```
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<Result<String>>>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ModelError) -> Self {
        self.push(Err(error));
        self
    }

    /// Answer with `responder` once the queue is exhausted.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, response: Result<String>) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }
}

#[async_trait]
impl GenerationProvider for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(provider = %self.name, call, prompt_len = request.prompt.len(), "mock generate");

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        let response = match (scripted, &self.responder) {
            (Some(response), _) => response,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(ModelError::Transport {
                provider: self.name.clone(),
                message: "no scripted response left".to_string(),
            }),
        };

        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        response
    }
}
