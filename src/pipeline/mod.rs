// src/pipeline/mod.rs — Fallback-chain diagnosis pipeline

pub mod guaranteed;
pub mod orchestrator;
pub mod prompt;
pub mod stages;
pub mod types;
pub mod validator;

pub use orchestrator::{FallbackPipeline, PipelineOutcome};
pub use stages::DiagnosisStage;
pub use types::{DeviceCategory, DiagnosisContext, DiagnosisResult, DiagnosisSource};
