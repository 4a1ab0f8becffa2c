// src/provider/mod.rs — External provider clients

pub mod google;
pub mod openai;
pub mod search;

use std::time::Duration;

use async_trait::async_trait;

use crate::infra::errors::DevicefixError;
use crate::pipeline::types::ImageRef;

pub use search::{SearchClient, SearchHit};

/// Core trait for AI completion backends. One text-in, text-out call with
/// optional image attachments; the caller owns prompt construction and
/// response validation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn id(&self) -> &'static str;

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DevicefixError>;
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub images: Vec<ImageRef>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Hard cap on the whole HTTP exchange; on expiry the stage fails and
    /// the pipeline moves on.
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            images: Vec::new(),
            max_tokens: None,
            temperature: None,
            timeout,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}
