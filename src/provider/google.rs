// src/provider/google.rs — Google Generative AI (Gemini) client (secondary backend)

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::infra::errors::DevicefixError;
use crate::pipeline::types::ImageRef;

pub struct GoogleProvider {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        "https://generativelanguage.googleapis.com/v1beta"
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": request.prompt })];

        for image in &request.images {
            match image {
                ImageRef::Inline { media_type, data } => {
                    parts.push(serde_json::json!({
                        "inline_data": {
                            "mime_type": media_type,
                            "data": data,
                        }
                    }));
                }
                // Gemini takes inline bytes only; hosted images are
                // referenced in the prompt text instead.
                ImageRef::Url(url) => {
                    parts.push(serde_json::json!({
                        "text": format!("(photo of the device: {url})")
                    }));
                }
            }
        }

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
        });

        if let Some(ref system) = request.system {
            body["system_instruction"] = serde_json::json!({
                "parts": [{ "text": system }],
            });
        }

        let mut gen_config = serde_json::json!({});
        if let Some(max_tokens) = request.max_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            gen_config["temperature"] = serde_json::json!(temp);
        }
        if gen_config != serde_json::json!({}) {
            body["generationConfig"] = gen_config;
        }

        body
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn id(&self) -> &'static str {
        "google"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DevicefixError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url(),
            request.model,
            self.api_key
        );
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| DevicefixError::adapter("google", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(DevicefixError::adapter(
                "google",
                format!("HTTP {status}: {error_body}"),
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DevicefixError::adapter("google", format!("bad response body: {e}")))?;

        let content = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.is_empty() {
            return Err(DevicefixError::adapter("google", "empty completion"));
        }

        Ok(CompletionResponse { content })
    }
}
