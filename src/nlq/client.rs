//! Completion client for LLM interactions

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AssistantConfig, LLMProvider};
use crate::nlq::{NLQError, NLQResult};

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prompt: String,
    /// Sampling temperature; the provider default when None
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

/// Black-box text completion endpoint
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Return the raw text produced for `request`
    async fn complete(&self, request: &CompletionRequest) -> NLQResult<String>;
}

/// HTTP client for the configured LLM provider
pub struct LlmClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
}

impl LlmClient {
    pub fn new(config: &AssistantConfig) -> NLQResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| NLQError::ConfigError(e.to_string()))?;

        if config.provider != LLMProvider::Ollama && config.api_key.is_none() {
            return Err(NLQError::ConfigError(format!(
                "{:?} requires an API key (--key or ${})",
                config.provider,
                crate::config::OPENAI_API_KEY_VAR
            )));
        }

        let api_base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| match config.provider {
                LLMProvider::OpenAI => "https://api.openai.com/v1".to_string(),
                LLMProvider::Ollama => "http://localhost:11434".to_string(),
                LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url,
        })
    }

    fn api_key(&self) -> NLQResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| NLQError::ConfigError(format!("{:?} requires API key", self.provider)))
    }

    async fn openai_chat(&self, request: &CompletionRequest) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            temperature: Option<f32>,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: Option<String>,
        }

        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&Request {
                model: &self.model,
                messages: vec![
                    Message { role: "system", content: &request.system_prompt },
                    Message { role: "user", content: &request.prompt },
                ],
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(NLQError::ApiError(format!("OpenAI error {}: {}", status, text)));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn ollama_chat(&self, request: &CompletionRequest) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Options {
            #[serde(skip_serializing_if = "Option::is_none")]
            temperature: Option<f32>,
            num_predict: u32,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
            system: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Request {
                model: &self.model,
                prompt: &request.prompt,
                system: &request.system_prompt,
                stream: false,
                options: Options {
                    temperature: request.temperature,
                    num_predict: request.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NLQError::ApiError(format!("Ollama error: {}", resp.status())));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;
        Ok(result.response)
    }

    async fn gemini_chat(&self, request: &CompletionRequest) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Request {
            contents: Vec<Content>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }

        #[derive(Serialize, Deserialize)]
        struct Content {
            role: Option<String>,
            parts: Vec<Part>,
        }

        #[derive(Serialize, Deserialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            #[serde(skip_serializing_if = "Option::is_none")]
            temperature: Option<f32>,
            #[serde(rename = "maxOutputTokens")]
            max_output_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }

        let api_key = self.api_key()?;
        // v1beta has no system role on every endpoint; prepend the instruction.
        let full_prompt = format!("{}\n\n{}", request.system_prompt, request.prompt);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base_url, self.model, api_key
        );

        let resp = self
            .client
            .post(&url)
            .json(&Request {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part { text: full_prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(NLQError::ApiError(format!("Gemini error: {}", text)));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;

        Ok(result
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|first| first.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default())
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> NLQResult<String> {
        debug!(
            "Sending completion to {:?} model {} ({} prompt chars)",
            self.provider,
            self.model,
            request.prompt.len()
        );
        match self.provider {
            LLMProvider::OpenAI => self.openai_chat(request).await,
            LLMProvider::Ollama => self.ollama_chat(request).await,
            LLMProvider::Gemini => self.gemini_chat(request).await,
        }
    }
}
