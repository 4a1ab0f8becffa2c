// src/pipeline/stages.rs — The adapters the fallback chain runs through

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::prompt;
use super::types::{DiagnosisContext, DiagnosisResult, DiagnosisSource};
use super::validator::validate_response;
use crate::infra::errors::DevicefixError;
use crate::provider::{CompletionProvider, CompletionRequest, SearchClient};
use crate::storage::Store;
use crate::util::{keywords, truncate_str};

/// One step of the fallback chain. Each stage is tried at most once per
/// request; any failure advances the pipeline, never the caller.
#[async_trait]
pub trait DiagnosisStage: Send + Sync {
    fn source(&self) -> DiagnosisSource;

    /// Unconfigured stages are skipped with a debug note instead of
    /// counting as failures.
    fn is_configured(&self) -> bool {
        true
    }

    /// Outer cap the orchestrator enforces around `attempt`.
    fn timeout(&self) -> Duration;

    async fn attempt(&self, ctx: &DiagnosisContext) -> Result<DiagnosisResult, DevicefixError>;
}

// ─── Stage 1: direct multimodal diagnosis ───────────────────────

pub struct DirectAiStage {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    timeout: Duration,
}

impl DirectAiStage {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: String, timeout: Duration) -> Self {
        Self {
            provider,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl DiagnosisStage for DirectAiStage {
    fn source(&self) -> DiagnosisSource {
        DiagnosisSource::DirectAi
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, ctx: &DiagnosisContext) -> Result<DiagnosisResult, DevicefixError> {
        let request = CompletionRequest::new(
            &self.model,
            prompt::direct_diagnosis_prompt(ctx),
            self.timeout,
        )
        .with_system(prompt::system_prompt())
        .with_images(ctx.images.clone());

        let response = self.provider.complete(request).await?;
        debug!(
            provider = self.provider.id(),
            raw = truncate_str(&response.content, 200),
            "direct diagnosis reply"
        );
        Ok(validate_response(&response.content)?)
    }
}

// ─── Stage 2: keyword match against the fault table ─────────────

pub struct KnowledgeBaseStage {
    store: Arc<Mutex<Store>>,
    timeout: Duration,
}

impl KnowledgeBaseStage {
    pub fn new(store: Arc<Mutex<Store>>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl DiagnosisStage for KnowledgeBaseStage {
    fn source(&self) -> DiagnosisSource {
        DiagnosisSource::KnowledgeBase
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, ctx: &DiagnosisContext) -> Result<DiagnosisResult, DevicefixError> {
        let words = keywords(&ctx.description);
        if words.is_empty() {
            return Err(DevicefixError::adapter(
                "knowledge_base",
                "description has no matchable words",
            ));
        }

        // Store faults are not ordinary stage failures; let them surface
        // as unexpected errors so the orchestrator logs them louder.
        let entries = {
            let store = self
                .store
                .lock()
                .map_err(|_| anyhow::anyhow!("fault table lock poisoned"))?;
            store.fault_entries_for(ctx.category)?
        };

        // Score each row by how many description keywords it contains
        let best = entries
            .into_iter()
            .map(|entry| {
                let text = entry.match_text();
                let score = words.iter().filter(|w| text.contains(w.as_str())).count();
                (score, entry)
            })
            .max_by_key(|(score, _)| *score);

        match best {
            Some((score, entry)) if score > 0 => {
                debug!(score, title = %entry.title, "fault table match");
                Ok(entry.into_result())
            }
            _ => Err(DevicefixError::adapter(
                "knowledge_base",
                "no fault entry scored above zero",
            )),
        }
    }
}

// ─── Stages 3/4: web search + AI summarization ──────────────────

pub struct WebSearchStage {
    search: Arc<SearchClient>,
    summarizer: Arc<dyn CompletionProvider>,
    model: String,
    source: DiagnosisSource,
    search_timeout: Duration,
    completion_timeout: Duration,
}

impl WebSearchStage {
    pub fn new(
        search: Arc<SearchClient>,
        summarizer: Arc<dyn CompletionProvider>,
        model: String,
        source: DiagnosisSource,
        search_timeout: Duration,
        completion_timeout: Duration,
    ) -> Self {
        Self {
            search,
            summarizer,
            model,
            source,
            search_timeout,
            completion_timeout,
        }
    }
}

#[async_trait]
impl DiagnosisStage for WebSearchStage {
    fn source(&self) -> DiagnosisSource {
        self.source
    }

    fn is_configured(&self) -> bool {
        self.search.is_configured()
    }

    fn timeout(&self) -> Duration {
        self.search_timeout + self.completion_timeout
    }

    async fn attempt(&self, ctx: &DiagnosisContext) -> Result<DiagnosisResult, DevicefixError> {
        let hits = self
            .search
            .search(&prompt::search_query(ctx), self.search_timeout)
            .await?;
        debug!(hits = hits.len(), "search results for summarization");

        let request = CompletionRequest::new(
            &self.model,
            prompt::search_summary_prompt(ctx, &hits),
            self.completion_timeout,
        )
        .with_system(prompt::system_prompt());

        let response = self.summarizer.complete(request).await?;
        Ok(validate_response(&response.content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::DeviceCategory;
    use crate::storage::StorageManager;

    fn knowledge_stage() -> KnowledgeBaseStage {
        let manager = StorageManager::in_memory().unwrap();
        KnowledgeBaseStage::new(
            Arc::new(Mutex::new(manager.store)),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_knowledge_stage_matches_battery_symptoms() {
        let stage = knowledge_stage();
        let ctx = DiagnosisContext::new(
            "battery drains fast and the phone shuts down suddenly",
            DeviceCategory::Device,
        );
        let result = stage.attempt(&ctx).await.unwrap();
        assert_eq!(result.problem, "Worn-out battery");
        assert!(!result.repair_steps.is_empty());
    }

    #[tokio::test]
    async fn test_knowledge_stage_respects_category() {
        let stage = knowledge_stage();
        // Capacitor symptoms exist only in the pcb table
        let ctx = DiagnosisContext::new(
            "capacitor looks bulging and leaking",
            DeviceCategory::Pcb,
        );
        let result = stage.attempt(&ctx).await.unwrap();
        assert_eq!(result.problem, "Bulging or leaking capacitors");
    }

    #[tokio::test]
    async fn test_knowledge_stage_fails_on_no_match() {
        let stage = knowledge_stage();
        let ctx = DiagnosisContext::new(
            "zzzz qqqqq xxxxx nonsense",
            DeviceCategory::Device,
        );
        let err = stage.attempt(&ctx).await.unwrap_err();
        assert!(err.is_stage_failure());
    }

    #[tokio::test]
    async fn test_knowledge_stage_store_fault_is_not_a_stage_failure() {
        let manager = StorageManager::in_memory().unwrap();
        manager
            .store
            .conn()
            .execute_batch("DROP TABLE fault_entries")
            .unwrap();
        let stage = KnowledgeBaseStage::new(
            Arc::new(Mutex::new(manager.store)),
            Duration::from_secs(5),
        );
        let ctx = DiagnosisContext::new("battery drains fast", DeviceCategory::Device);
        let err = stage.attempt(&ctx).await.unwrap_err();
        assert!(!err.is_stage_failure());
    }

    #[tokio::test]
    async fn test_knowledge_stage_fails_on_short_words_only() {
        let stage = knowledge_stage();
        let ctx = DiagnosisContext::new("it is bad", DeviceCategory::Device);
        let err = stage.attempt(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("no matchable words"));
    }

    #[test]
    fn test_web_search_stage_unconfigured_when_search_missing() {
        struct NoopProvider;
        #[async_trait]
        impl CompletionProvider for NoopProvider {
            fn id(&self) -> &'static str {
                "noop"
            }
            async fn complete(
                &self,
                _request: CompletionRequest,
            ) -> Result<crate::provider::CompletionResponse, DevicefixError> {
                unreachable!("stage must be skipped before calling the summarizer")
            }
        }

        let stage = WebSearchStage::new(
            Arc::new(SearchClient::unconfigured()),
            Arc::new(NoopProvider),
            "model".into(),
            DiagnosisSource::WebSearchAi,
            Duration::from_secs(15),
            Duration::from_secs(45),
        );
        assert!(!stage.is_configured());
        assert_eq!(stage.timeout(), Duration::from_secs(60));
    }
}
