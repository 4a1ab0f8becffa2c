// src/pipeline/validator.rs — Validate raw provider output into a DiagnosisResult

use thiserror::Error;

use super::types::DiagnosisResult;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("response JSON did not parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("required fields missing or empty: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Extract and validate a `DiagnosisResult` from raw model output.
///
/// Providers are prompted to answer with a bare JSON object but routinely
/// wrap it in prose or markdown fences, so this takes the substring from
/// the first `{` to the last `}` before parsing. A result is all-or-nothing:
/// any missing required field rejects the whole payload and the caller
/// advances to the next stage.
pub fn validate_response(raw: &str) -> Result<DiagnosisResult, ValidationError> {
    let json = extract_json_object(raw).ok_or(ValidationError::NoJsonObject)?;
    let result: DiagnosisResult = serde_json::from_str(json)?;

    let mut missing = Vec::new();
    if result.problem.trim().is_empty() {
        missing.push("problem");
    }
    if result.explanation.trim().is_empty() {
        missing.push("explanation");
    }
    if result.repair_steps.iter().all(|s| s.trim().is_empty()) {
        missing.push("repairSteps");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    Ok(result)
}

/// Substring from the first `{` to the last `}`, if both exist in order.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "problem": "Cracked screen",
        "explanation": "Impact damage to the display assembly.",
        "repairSteps": ["Power off", "Replace display assembly"],
        "toolsNeeded": ["pentalobe screwdriver", "suction cup"],
        "estimatedCost": "$80-150",
        "difficulty": "medium",
        "successRate": "high",
        "timeRequired": "1 hour",
        "safetyWarnings": ["Disconnect the battery first"]
    }"#;

    #[test]
    fn test_valid_bare_json() {
        let r = validate_response(VALID).unwrap();
        assert_eq!(r.problem, "Cracked screen");
        assert_eq!(r.repair_steps.len(), 2);
        assert_eq!(r.safety_warnings.len(), 1);
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let raw = format!("Here is the diagnosis you asked for:\n```json\n{VALID}\n```\nGood luck!");
        let r = validate_response(&raw).unwrap();
        assert_eq!(r.problem, "Cracked screen");
    }

    #[test]
    fn test_no_json_object() {
        let err = validate_response("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ValidationError::NoJsonObject));
    }

    #[test]
    fn test_malformed_json() {
        let err = validate_response(r#"{"problem": "x", "#).unwrap_err();
        assert!(matches!(err, ValidationError::Parse(_)));
    }

    #[test]
    fn test_missing_repair_steps_field() {
        let raw = r#"{
            "problem": "p",
            "explanation": "e",
            "toolsNeeded": []
        }"#;
        // repairSteps has no serde default, so this is a parse error
        let err = validate_response(raw).unwrap_err();
        assert!(matches!(err, ValidationError::Parse(_)));
    }

    #[test]
    fn test_empty_repair_steps_rejected() {
        let raw = r#"{
            "problem": "p",
            "explanation": "e",
            "repairSteps": [],
            "toolsNeeded": []
        }"#;
        let err = validate_response(raw).unwrap_err();
        match err {
            ValidationError::MissingFields(fields) => {
                assert_eq!(fields, vec!["repairSteps"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_only_required_fields_rejected() {
        let raw = r#"{
            "problem": "  ",
            "explanation": "",
            "repairSteps": [" "],
            "toolsNeeded": []
        }"#;
        let err = validate_response(raw).unwrap_err();
        match err {
            ValidationError::MissingFields(fields) => {
                assert_eq!(fields, vec!["problem", "explanation", "repairSteps"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_fields_get_sentinels() {
        let raw = r#"{
            "problem": "Loose cable",
            "explanation": "The internal display cable has worked loose.",
            "repairSteps": ["Reseat the cable"],
            "toolsNeeded": ["spudger"]
        }"#;
        let r = validate_response(raw).unwrap();
        assert_eq!(r.estimated_cost, "unknown");
        assert_eq!(r.time_required, "varies");
    }

    #[test]
    fn test_braces_out_of_order() {
        assert!(matches!(
            validate_response("} nothing here {"),
            Err(ValidationError::NoJsonObject)
        ));
    }
}
