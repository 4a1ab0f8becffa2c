// src/pipeline/orchestrator.rs — Ordered fallback chain with a guaranteed terminal stage

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use super::guaranteed;
use super::stages::{DiagnosisStage, DirectAiStage, KnowledgeBaseStage, WebSearchStage};
use super::types::{DiagnosisContext, DiagnosisResult, DiagnosisSource};
use crate::infra::config::Config;
use crate::provider::{google::GoogleProvider, openai::OpenAiProvider, CompletionProvider, SearchClient};
use crate::storage::Store;

/// What the pipeline produced and where it came from.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub result: DiagnosisResult,
    pub source: DiagnosisSource,
    /// Stages that actually ran (skipped ones excluded). For logging and
    /// latency attribution.
    pub stages_attempted: usize,
}

/// The ordered fallback chain.
///
/// Stages run strictly sequentially, each tried once under its own timeout,
/// short-circuiting on the first validated success. Stages never race in
/// parallel, so a request costs at most one pass over the paid externals.
/// `run` cannot fail: the dependency-free guaranteed stage absorbs every
/// path, so an entitled caller always gets a well-formed result. Stage
/// failures log at warn, anything unexpected at error.
pub struct FallbackPipeline {
    stages: Vec<Arc<dyn DiagnosisStage>>,
}

impl FallbackPipeline {
    pub fn new(stages: Vec<Arc<dyn DiagnosisStage>>) -> Self {
        Self { stages }
    }

    /// Assemble the standard chain from configuration: direct AI, fault
    /// table, web search with primary then secondary summarizer. Stages
    /// whose credentials are absent are either left out here or skip
    /// themselves at run time.
    pub fn from_config(config: &Config, store: Arc<Mutex<Store>>) -> Self {
        let providers = &config.providers;
        let timeouts = &config.timeouts;

        let openai: Option<Arc<dyn CompletionProvider>> = providers
            .openai_api_key
            .clone()
            .map(|key| Arc::new(OpenAiProvider::new(key)) as Arc<dyn CompletionProvider>);
        let google: Option<Arc<dyn CompletionProvider>> = providers
            .google_api_key
            .clone()
            .map(|key| Arc::new(GoogleProvider::new(key)) as Arc<dyn CompletionProvider>);
        let search = Arc::new(SearchClient::new(
            providers.search_api_key.clone(),
            providers.search_engine_id.clone(),
        ));

        let mut stages: Vec<Arc<dyn DiagnosisStage>> = Vec::new();

        // Direct diagnosis rides the primary backend, or the secondary
        // when only that one is configured.
        match (&openai, &google) {
            (Some(provider), _) => stages.push(Arc::new(DirectAiStage::new(
                provider.clone(),
                config.models.primary.clone(),
                timeouts.completion(),
            ))),
            (None, Some(provider)) => stages.push(Arc::new(DirectAiStage::new(
                provider.clone(),
                config.models.secondary.clone(),
                timeouts.completion(),
            ))),
            (None, None) => debug!("no completion provider configured, direct stage disabled"),
        }

        stages.push(Arc::new(KnowledgeBaseStage::new(
            store,
            timeouts.knowledge(),
        )));

        if let Some(provider) = openai {
            stages.push(Arc::new(WebSearchStage::new(
                search.clone(),
                provider,
                config.models.primary.clone(),
                DiagnosisSource::WebSearchAi,
                timeouts.search(),
                timeouts.completion(),
            )));
        }
        if let Some(provider) = google {
            stages.push(Arc::new(WebSearchStage::new(
                search,
                provider,
                config.models.secondary.clone(),
                DiagnosisSource::WebSearchSecondaryAi,
                timeouts.search(),
                timeouts.completion(),
            )));
        }

        Self::new(stages)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run the chain to completion. Infallible by contract: the guaranteed
    /// stage terminates every path with a valid category-specific result.
    pub async fn run(&self, ctx: &DiagnosisContext) -> PipelineOutcome {
        let mut attempted = 0;

        for stage in &self.stages {
            let source = stage.source();

            if !stage.is_configured() {
                debug!(stage = %source, "stage unconfigured, skipping");
                continue;
            }

            attempted += 1;
            match tokio::time::timeout(stage.timeout(), stage.attempt(ctx)).await {
                Ok(Ok(result)) => {
                    info!(stage = %source, attempted, "diagnosis produced");
                    return PipelineOutcome {
                        result,
                        source,
                        stages_attempted: attempted,
                    };
                }
                Ok(Err(e)) if e.is_stage_failure() => {
                    warn!(stage = %source, "stage failed, advancing: {e}");
                }
                Ok(Err(e)) => {
                    // Not an expected degradation; keep the contract but
                    // make sure operators see it.
                    error!(stage = %source, "unexpected error in stage, advancing: {e}");
                }
                Err(_) => {
                    warn!(stage = %source, timeout = ?stage.timeout(), "stage timed out, advancing");
                }
            }
        }

        info!(
            attempted,
            category = %ctx.category,
            "all stages exhausted, serving guaranteed fallback"
        );
        PipelineOutcome {
            result: guaranteed::for_category(ctx.category),
            source: DiagnosisSource::GuaranteedFallback,
            stages_attempted: attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::DeviceCategory;
    use crate::storage::StorageManager;

    #[tokio::test]
    async fn test_empty_chain_serves_guaranteed_fallback() {
        let pipeline = FallbackPipeline::new(vec![]);
        let ctx = DiagnosisContext::new("anything", DeviceCategory::Pcb);
        let outcome = pipeline.run(&ctx).await;
        assert_eq!(outcome.source, DiagnosisSource::GuaranteedFallback);
        assert_eq!(outcome.stages_attempted, 0);
        assert!(!outcome.result.repair_steps.is_empty());
    }

    #[test]
    fn test_from_config_without_credentials_keeps_local_stages() {
        let config = Config::default();
        let store = StorageManager::in_memory().unwrap().store;
        let pipeline = FallbackPipeline::from_config(&config, Arc::new(Mutex::new(store)));
        // Only the knowledge-base stage survives with no credentials at all
        assert_eq!(pipeline.stage_count(), 1);
    }

    #[test]
    fn test_from_config_with_all_credentials_builds_full_chain() {
        let mut config = Config::default();
        config.providers.openai_api_key = Some("sk-test".into());
        config.providers.google_api_key = Some("g-test".into());
        config.providers.search_api_key = Some("s-test".into());
        config.providers.search_engine_id = Some("cx-test".into());

        let store = StorageManager::in_memory().unwrap().store;
        let pipeline = FallbackPipeline::from_config(&config, Arc::new(Mutex::new(store)));
        // direct + knowledge + two search stages
        assert_eq!(pipeline.stage_count(), 4);
    }
}
