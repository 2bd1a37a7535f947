use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::GenerationError;

/// A text-generation service: one prompt in, one raw response out.
///
/// The response is returned undecoded so the caller decides which shapes
/// it accepts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn run(&self, model: &str, prompt: &str) -> Result<Value, GenerationError>;
}

/// Ollama HTTP client for text generation.
pub struct OllamaGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: &str) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Default Ollama instance at localhost:11434.
    pub fn default_local() -> Result<Self, GenerationError> {
        Self::new("http://localhost:11434")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn run(&self, model: &str, prompt: &str) -> Result<Value, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.base_url.clone())
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))
    }
}

type Script = Box<dyn Fn(&str) -> Result<Value, GenerationError> + Send + Sync>;

/// Scripted generator for tests: answers from a closure over the prompt
/// and records every prompt it was given.
pub struct MockTextGenerator {
    script: Script,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    /// Always answer with `response`.
    pub fn new(response: Value) -> Self {
        Self::scripted(move |_| Ok(response.clone()))
    }

    /// Always answer with a bare string.
    pub fn text(answer: &str) -> Self {
        Self::new(Value::String(answer.to_string()))
    }

    /// Always fail with `message`.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::scripted(move |_| Err(GenerationError::Other(message.clone())))
    }

    pub fn scripted(
        script: impl Fn(&str) -> Result<Value, GenerationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn run(&self, _model: &str, prompt: &str) -> Result<Value, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(prompt)
    }
}
