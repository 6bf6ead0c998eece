//! OpenAI Chat Completions API client.
//!
//! This module implements [`CompletionClient`] for the Chat Completions API
//! (`/v1/chat/completions`, or the Azure deployment route) as a single
//! non-streaming request.

use serde::Deserialize;

use super::{CompletionClient, CompletionError, CompletionRequest, LlmSettings};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given settings.
    pub fn new(settings: LlmSettings) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CompletionError::Http(e.to_string()))?;
        Ok(Self { http, settings })
    }

    /// Fully resolved chat completions URL.
    pub fn chat_url(&self) -> String {
        self.settings
            .provider
            .build_chat_url(&self.settings.base_url)
    }
}

#[async_trait::async_trait]
impl CompletionClient for ChatCompletionsClient {
    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(CompletionError::NotConfigured)?;

        let rb = self.http.post(self.chat_url()).json(&req);
        let rb = self.settings.provider.authorize(rb, api_key);

        let resp = rb
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Http(e.without_url().to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        tracing::debug!(
            name: "llm.completion.received",
            chars = text.len(),
            "Completion received"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, Provider};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![Message::system("be kind"), Message::user("hello")],
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    fn settings(base_url: String, provider: Provider, key: Option<&str>) -> LlmSettings {
        LlmSettings {
            base_url,
            api_key: key.map(ToString::to_string),
            provider,
            timeout: Duration::from_secs(5),
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_generic_provider_uses_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 2000,
                "messages": [
                    { "role": "system", "content": "be kind" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("## Key Findings")))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            ChatCompletionsClient::new(settings(server.uri(), Provider::Generic, Some("sk-test")))
                .unwrap();
        let text = client.complete(request()).await.unwrap();
        assert_eq!(text, "## Key Findings");
    }

    #[tokio::test]
    async fn test_azure_uses_deployment_route_and_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-08-01-preview"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::AzureOpenAI {
            deployment_name: "gpt-4o".to_string(),
            api_version: "2024-08-01-preview".to_string(),
        };
        let client =
            ChatCompletionsClient::new(settings(server.uri(), provider, Some("azure-key"))).unwrap();
        assert_eq!(client.complete(request()).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached for gpt-4o" }
            })))
            .mount(&server)
            .await;

        let client =
            ChatCompletionsClient::new(settings(server.uri(), Provider::Generic, Some("sk-test")))
                .unwrap();
        let err = client.complete(request()).await.unwrap_err();
        match err {
            CompletionError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached for gpt-4o");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client =
            ChatCompletionsClient::new(settings(server.uri(), Provider::Generic, Some("sk-test")))
                .unwrap();
        assert!(matches!(
            client.complete(request()).await,
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("never")))
            .expect(0)
            .mount(&server)
            .await;

        let client =
            ChatCompletionsClient::new(settings(server.uri(), Provider::Generic, None)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.complete(request()).await,
            Err(CompletionError::NotConfigured)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = ChatCompletionsClient::new(settings(
            "https://api.openai.com".to_string(),
            Provider::OpenAI,
            Some("sk-very-secret"),
        ))
        .unwrap();
        assert!(!format!("{client:?}").contains("sk-very-secret"));
    }
}
