// src/infra/errors.rs — Error types for devicefix

use thiserror::Error;

use crate::pipeline::validator::ValidationError;

#[derive(Error, Debug)]
pub enum DevicefixError {
    // Stage-level failures, always absorbed by the orchestrator
    #[error("Stage '{stage}' failed: {message}")]
    Adapter { stage: &'static str, message: String },

    #[error("Response validation failed: {0}")]
    Validation(#[from] ValidationError),

    // Anything a stage did not expect, e.g. a store fault
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevicefixError {
    /// Stage failures are absorbed by the fallback pipeline; everything
    /// else indicates something operators need to look at.
    pub fn is_stage_failure(&self) -> bool {
        matches!(
            self,
            DevicefixError::Adapter { .. } | DevicefixError::Validation(_)
        )
    }

    pub fn adapter(stage: &'static str, message: impl Into<String>) -> Self {
        DevicefixError::Adapter {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_classification() {
        assert!(DevicefixError::adapter("search", "no results").is_stage_failure());
        assert!(
            DevicefixError::Validation(ValidationError::NoJsonObject).is_stage_failure()
        );
        assert!(!DevicefixError::from(anyhow::anyhow!("store fault")).is_stage_failure());
    }
}
