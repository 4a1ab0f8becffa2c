// src/pipeline/types.rs — Diagnosis data model

use serde::{Deserialize, Serialize};

/// The validated, structured output of the pipeline.
///
/// Either fully populated or absent: the validator rejects payloads that
/// are missing any required field, so a partially-filled result never
/// escapes a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub problem: String,
    pub explanation: String,
    pub repair_steps: Vec<String>,
    pub tools_needed: Vec<String>,
    #[serde(default = "unknown")]
    pub estimated_cost: String,
    #[serde(default = "varies")]
    pub difficulty: String,
    #[serde(default = "unknown")]
    pub success_rate: String,
    #[serde(default = "varies")]
    pub time_required: String,
    #[serde(default)]
    pub safety_warnings: Vec<String>,
}

pub(crate) fn unknown() -> String {
    "unknown".into()
}

pub(crate) fn varies() -> String {
    "varies".into()
}

/// Which stage produced the result. Recorded on the session and returned
/// to the client for provenance; never rendered raw to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisSource {
    DirectAi,
    KnowledgeBase,
    WebSearchAi,
    WebSearchSecondaryAi,
    GuaranteedFallback,
}

impl DiagnosisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisSource::DirectAi => "direct_ai",
            DiagnosisSource::KnowledgeBase => "knowledge_base",
            DiagnosisSource::WebSearchAi => "web_search_ai",
            DiagnosisSource::WebSearchSecondaryAi => "web_search_secondary_ai",
            DiagnosisSource::GuaranteedFallback => "guaranteed_fallback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct_ai" => Some(DiagnosisSource::DirectAi),
            "knowledge_base" => Some(DiagnosisSource::KnowledgeBase),
            "web_search_ai" => Some(DiagnosisSource::WebSearchAi),
            "web_search_secondary_ai" => Some(DiagnosisSource::WebSearchSecondaryAi),
            "guaranteed_fallback" => Some(DiagnosisSource::GuaranteedFallback),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiagnosisSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device category tag selecting the fault table and the canned fallback
/// content. Free-form on the wire; anything unrecognized maps to `Device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Device,
    Pcb,
    Appliance,
}

impl DeviceCategory {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "pcb" | "board" | "circuit" => DeviceCategory::Pcb,
            "appliance" => DeviceCategory::Appliance,
            _ => DeviceCategory::Device,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCategory::Device => "device",
            DeviceCategory::Pcb => "pcb",
            DeviceCategory::Appliance => "appliance",
        }
    }
}

impl std::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a user-supplied image, either hosted or inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ImageRef {
    Url(String),
    /// Base64-encoded image bytes with a media type, e.g. "image/jpeg".
    Inline { media_type: String, data: String },
}

/// A clarifying question the client already asked the user, with the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyingAnswer {
    pub question: String,
    pub answer: String,
}

/// Everything a stage needs to attempt a diagnosis.
#[derive(Debug, Clone)]
pub struct DiagnosisContext {
    pub description: String,
    pub category: DeviceCategory,
    pub images: Vec<ImageRef>,
    pub clarifying_answers: Vec<ClarifyingAnswer>,
}

impl DiagnosisContext {
    pub fn new(description: impl Into<String>, category: DeviceCategory) -> Self {
        Self {
            description: description.into(),
            category,
            images: Vec::new(),
            clarifying_answers: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    pub fn with_answers(mut self, answers: Vec<ClarifyingAnswer>) -> Self {
        self.clarifying_answers = answers;
        self
    }
}

/// Lifecycle of a diagnostic session. Completed and failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SessionStatus::Pending),
            "analyzing" => Some(SessionStatus::Analyzing),
            "completed" => Some(SessionStatus::Completed),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trip() {
        for s in [
            DiagnosisSource::DirectAi,
            DiagnosisSource::KnowledgeBase,
            DiagnosisSource::WebSearchAi,
            DiagnosisSource::WebSearchSecondaryAi,
            DiagnosisSource::GuaranteedFallback,
        ] {
            assert_eq!(DiagnosisSource::parse(s.as_str()), Some(s));
        }
        assert!(DiagnosisSource::parse("nonsense").is_none());
    }

    #[test]
    fn test_source_wire_tag() {
        assert_eq!(
            DiagnosisSource::GuaranteedFallback.to_string(),
            "guaranteed_fallback"
        );
    }

    #[test]
    fn test_category_from_tag() {
        assert_eq!(DeviceCategory::from_tag("pcb"), DeviceCategory::Pcb);
        assert_eq!(DeviceCategory::from_tag("Board"), DeviceCategory::Pcb);
        assert_eq!(
            DeviceCategory::from_tag("appliance"),
            DeviceCategory::Appliance
        );
        assert_eq!(DeviceCategory::from_tag("phone"), DeviceCategory::Device);
        assert_eq!(DeviceCategory::from_tag(""), DeviceCategory::Device);
    }

    #[test]
    fn test_status_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::Analyzing.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            SessionStatus::Pending,
            SessionStatus::Analyzing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_result_serde_camel_case() {
        let result = DiagnosisResult {
            problem: "Dead battery".into(),
            explanation: "The battery no longer holds a charge.".into(),
            repair_steps: vec!["Replace the battery".into()],
            tools_needed: vec!["screwdriver".into()],
            estimated_cost: "$20-40".into(),
            difficulty: "easy".into(),
            success_rate: "high".into(),
            time_required: "30 minutes".into(),
            safety_warnings: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["repairSteps"][0], "Replace the battery");
        assert_eq!(json["toolsNeeded"][0], "screwdriver");
        assert_eq!(json["estimatedCost"], "$20-40");
    }

    #[test]
    fn test_result_optional_fields_default_to_sentinels() {
        let json = r#"{
            "problem": "p",
            "explanation": "e",
            "repairSteps": ["s"],
            "toolsNeeded": []
        }"#;
        let result: DiagnosisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.estimated_cost, "unknown");
        assert_eq!(result.difficulty, "varies");
        assert_eq!(result.success_rate, "unknown");
        assert_eq!(result.time_required, "varies");
        assert!(result.safety_warnings.is_empty());
    }
}
