// src/provider/openai.rs — OpenAI Chat Completions client (primary backend)

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::infra::errors::DevicefixError;
use crate::pipeline::types::ImageRef;

pub struct OpenAiProvider {
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> &str {
        "https://api.openai.com/v1/chat/completions"
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        // The user turn is a content-part array when images are attached,
        // a plain string otherwise.
        let user_content = if request.images.is_empty() {
            serde_json::json!(request.prompt)
        } else {
            let mut parts = vec![serde_json::json!({
                "type": "text",
                "text": request.prompt,
            })];
            for image in &request.images {
                let url = match image {
                    ImageRef::Url(url) => url.clone(),
                    ImageRef::Inline { media_type, data } => {
                        format!("data:{media_type};base64,{data}")
                    }
                };
                parts.push(serde_json::json!({
                    "type": "image_url",
                    "image_url": { "url": url },
                }));
            }
            serde_json::json!(parts)
        };

        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": user_content,
        }));

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DevicefixError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| DevicefixError::adapter("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(DevicefixError::adapter(
                "openai",
                format!("HTTP {status}: {error_body}"),
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DevicefixError::adapter("openai", format!("bad response body: {e}")))?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if content.is_empty() {
            return Err(DevicefixError::adapter("openai", "empty completion"));
        }

        Ok(CompletionResponse { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new("sk-test".into())
    }

    #[test]
    fn test_body_plain_text() {
        let req = CompletionRequest::new("gpt-4o-mini", "fix my phone", Duration::from_secs(45))
            .with_system("technician");
        let body = provider().build_request_body(&req);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "fix my phone");
    }

    #[test]
    fn test_body_with_image_url() {
        let req = CompletionRequest::new("gpt-4o-mini", "what is broken", Duration::from_secs(45))
            .with_images(vec![ImageRef::Url("https://img.example/x.jpg".into())]);
        let body = provider().build_request_body(&req);
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "https://img.example/x.jpg");
    }

    #[test]
    fn test_body_with_inline_image() {
        let req = CompletionRequest::new("gpt-4o-mini", "what is broken", Duration::from_secs(45))
            .with_images(vec![ImageRef::Inline {
                media_type: "image/jpeg".into(),
                data: "QUJD".into(),
            }]);
        let body = provider().build_request_body(&req);
        let url = body["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert_eq!(url, "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn test_body_optional_params() {
        let mut req = CompletionRequest::new("gpt-4o-mini", "p", Duration::from_secs(45));
        req.max_tokens = Some(1024);
        req.temperature = Some(0.2);
        let body = provider().build_request_body(&req);
        assert_eq!(body["max_tokens"], 1024);
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 0.001);
    }
}
