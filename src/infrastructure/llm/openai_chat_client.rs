use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{LlmClient, LlmClientError, Prompt};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::config::LlmSettings;

/// Chat-completions client for OpenAI-compatible providers.
pub struct OpenAiChatClient {
    client: Client,
    provider: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiChatClient {
    fn build_messages(prompt: &Prompt) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: prompt.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            },
        ]
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.provider == "azure" {
            request.header("api-key", &self.api_key)
        } else {
            request.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmClientError> {
        tracing::debug!(prompt = %sanitize_prompt(&prompt.user), "Sending chat completion");

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: Self::build_messages(prompt),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request_body);
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| LlmClientError::ApiRequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmClientError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status,
                sanitize_prompt(&body)
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmClientError::InvalidResponse("empty choices".to_string()))?;

        tracing::debug!(output = %sanitize_prompt(&content), "Chat completion received");
        Ok(content)
    }
}

pub fn create_chat_client(settings: &LlmSettings) -> Result<OpenAiChatClient, LlmClientError> {
    let base_url = match settings.provider.as_str() {
        "openai" => settings
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string(),
        "lmstudio" => settings
            .base_url
            .clone()
            .ok_or_else(|| {
                LlmClientError::InvalidResponse(
                    "base_url required for lmstudio provider".to_string(),
                )
            })?
            .trim_end_matches('/')
            .to_string(),
        "azure" => {
            let endpoint = settings.azure_endpoint.as_ref().ok_or_else(|| {
                LlmClientError::InvalidResponse(
                    "azure_endpoint required for azure provider".to_string(),
                )
            })?;
            format!(
                "{}/openai/deployments/{}",
                endpoint.trim_end_matches('/'),
                settings.chat_model
            )
        }
        _ => {
            return Err(LlmClientError::InvalidResponse(format!(
                "unknown provider: {}",
                settings.provider
            )));
        }
    };

    Ok(OpenAiChatClient {
        client: Client::new(),
        provider: settings.provider.clone(),
        base_url,
        api_key: settings.api_key.clone(),
        model: settings.chat_model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    })
}
