//! Generation provider abstraction and implementations.
//!
//! Defines the [`Generator`] trait and concrete implementations:
//! - **[`OpenAiGenerator`]** — calls the OpenAI chat completions API.
//! - **[`OllamaGenerator`]** — calls a local Ollama instance's `/api/generate` endpoint.
//!
//! Providers share the retry/backoff and error taxonomy of the embedding
//! providers (see [`crate::provider`]). The engine never lets a generation
//! failure escape to the caller — it is converted into a user-facing answer
//! string — so both implementations report failures as [`ProviderError`]
//! values rather than panicking or retrying forever.

use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::models::Prompt;
use crate::provider::{backoff_delay, classify_status, http_client, ProviderError};

/// A capability to produce a natural-language answer from a rendered prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"llama3.1"`).
    fn model_name(&self) -> &str;
    /// Generate an answer for the prompt.
    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

// ============ OpenAI Provider ============

/// Generator using the OpenAI chat completions API.
///
/// Sends the rendered prompt as a single user message to
/// `POST /v1/chat/completions`. Requires `OPENAI_API_KEY`.
pub struct OpenAiGenerator {
    model: String,
    temperature: f32,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, ProviderError> {
        let model = config.model.clone().ok_or_else(|| {
            ProviderError::Service("generation.model required for OpenAI provider".to_string())
        })?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(ProviderError::Auth(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }

        Ok(Self {
            model,
            temperature: config.temperature,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Auth("OPENAI_API_KEY not set".to_string()))?;

        let client = http_client(self.timeout_secs)?;
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt.text}],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let resp = client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value =
                            response.json().await.map_err(ProviderError::service)?;
                        return parse_openai_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let (err, retryable) = classify_status(status, &body_text);
                    if !retryable {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    last_err = Some(ProviderError::service(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ProviderError::Service("generation failed after retries".to_string())
        }))
    }
}

fn parse_openai_response(json: &serde_json::Value) -> Result<String, ProviderError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            ProviderError::Service("invalid OpenAI response: missing message content".to_string())
        })
}

// ============ Ollama Provider ============

/// Generator using a local Ollama instance.
///
/// Calls `POST /api/generate` with `stream: false` on the configured Ollama
/// URL (default: `http://localhost:11434`). Requires Ollama to be running
/// with a chat model pulled (e.g. `ollama pull llama3.1`).
pub struct OllamaGenerator {
    model: String,
    url: String,
    temperature: f32,
    max_retries: u32,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, ProviderError> {
        let model = config.model.clone().ok_or_else(|| {
            ProviderError::Service("generation.model required for Ollama provider".to_string())
        })?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model,
            url,
            temperature: config.temperature,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let client = http_client(self.timeout_secs)?;
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt.text,
            "stream": false,
            "options": {"temperature": self.temperature},
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let resp = client
                .post(format!("{}/api/generate", self.url))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value =
                            response.json().await.map_err(ProviderError::service)?;
                        return parse_ollama_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let (err, retryable) = classify_status(status, &body_text);
                    if !retryable {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    last_err = Some(ProviderError::Service(format!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url, e
                    )));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ProviderError::Service("Ollama generation failed after retries".to_string())
        }))
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<String, ProviderError> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            ProviderError::Service("invalid Ollama response: missing response field".to_string())
        })
}

/// Create the appropriate [`Generator`] based on configuration.
///
/// # Supported Providers
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"openai"` | [`OpenAiGenerator`] |
/// | `"ollama"` | [`OllamaGenerator`] |
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>, ProviderError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => Err(ProviderError::Service(format!(
            "unknown generation provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_openai_shape() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": " The answer. "}}]
        });
        assert_eq!(parse_openai_response(&json).unwrap(), "The answer.");
    }

    #[test]
    fn parse_openai_rejects_empty_choices() {
        let json = serde_json::json!({"choices": []});
        assert!(parse_openai_response(&json).is_err());
    }

    #[test]
    fn parse_ollama_shape() {
        let json = serde_json::json!({"model": "llama3.1", "response": "Hi there.\n"});
        assert_eq!(parse_ollama_response(&json).unwrap(), "Hi there.");
    }

    #[test]
    fn parse_ollama_rejects_missing_response() {
        assert!(parse_ollama_response(&serde_json::json!({"done": true})).is_err());
    }
}
