use super::{GenerationRequest, InferenceClient, InferenceError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock inference client with controlled responses for tests.
pub struct MockInferenceClient {
    pub response_mode: MockResponseMode,
    calls: AtomicUsize,
}

#[derive(Clone, Debug)]
pub enum MockResponseMode {
    /// Always return the given URL
    FixedUrl(String),
    /// Return a URL derived from the request kind and prompt
    EchoPrompt,
    /// Fail every call
    Failure,
    /// Succeed at the HTTP level but yield an empty result
    EmptyResult,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::with_mode(MockResponseMode::EchoPrompt)
    }

    pub fn with_mode(response_mode: MockResponseMode) -> Self {
        Self {
            response_mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self::with_mode(MockResponseMode::FixedUrl(url.into()))
    }

    /// Number of generate calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.response_mode {
            MockResponseMode::FixedUrl(url) => Ok(url.clone()),
            MockResponseMode::EchoPrompt => Ok(format!(
                "https://cdn.mock.example/{}/{}.bin",
                request.kind,
                slug(&request.prompt)
            )),
            MockResponseMode::Failure => Err(InferenceError::Request(
                "mock inference failure".to_string(),
            )),
            MockResponseMode::EmptyResult => Err(InferenceError::EmptyResult),
        }
    }
}

fn slug(prompt: &str) -> String {
    prompt
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
