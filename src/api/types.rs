// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::entitlement::DeniedReason;
use crate::pipeline::types::{ClarifyingAnswer, DiagnosisResult, ImageRef};

/// Request body for starting a diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRequest {
    /// Client-chosen session id; generated server-side when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub device_category: Option<String>,
    #[serde(default)]
    pub image_refs: Vec<ImageRef>,
    #[serde(default)]
    pub clarifying_answers: Vec<ClarifyingAnswer>,
}

/// Response for a completed diagnosis. Always a full result; provenance is
/// in `source` so the UI can flag low-confidence (guaranteed_fallback)
/// answers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResponse {
    pub success: bool,
    pub session_id: String,
    pub source: String,
    pub diagnosis: DiagnosisResult,
}

/// Response for a session lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub status: String,
    pub source: Option<String>,
    pub diagnosis: Option<DiagnosisResult>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }

    pub fn denied(reason: DeniedReason) -> Self {
        Self::new(reason.code())
    }
}
