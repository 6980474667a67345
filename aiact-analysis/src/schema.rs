//! The JSON shape the generation model must answer with.
//!
//! Answers are validated against [`analysis_schema`] before they are
//! deserialized: required fields must be present with the right types and
//! scores must lie in `[0, 1]`. Only `contains_ai` and `ai_confidence` are
//! optional and fall back to `false` / `0.0`.

use std::sync::LazyLock;

use aiact_core::{ModelError, ProjectAnalysis, Risk, RiskLevel, parse_validated};
use jsonschema::Validator;
use serde::Deserialize;
use serde_json::{Value, json};

static ANALYSIS_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new(&analysis_schema()).expect("unreachable error: analysis schema is valid")
});

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    project_name: String,
    description: String,
    #[serde(default)]
    contains_ai: Option<bool>,
    #[serde(default)]
    ai_confidence: Option<f64>,
    risks: Vec<RawRisk>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    description: String,
    category: String,
    level: RiskLevel,
    #[serde(default)]
    eu_act_reference: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
}

/// JSON schema of an analysis answer.
///
/// Sent as the response hint with the extraction request and used to
/// validate the answer.
pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "required": ["project_name", "description", "risks"],
        "properties": {
            "project_name": {"type": "string", "pattern": "\\S"},
            "description": {"type": "string"},
            "contains_ai": {"type": "boolean"},
            "ai_confidence": {"type": "number", "minimum": 0, "maximum": 1},
            "risks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["description", "category", "level"],
                    "properties": {
                        "description": {"type": "string", "pattern": "\\S"},
                        "category": {"type": "string"},
                        "level": {"type": "string", "enum": ["high", "low"]},
                        "eu_act_reference": {"type": "string"},
                        "confidence_score": {"type": "number", "minimum": 0, "maximum": 1}
                    }
                }
            }
        }
    })
}

/// Parse a model response into a [`ProjectAnalysis`].
///
/// Risks are split into high and low strictly by their `level` field.
pub fn parse_analysis(text: &str) -> Result<ProjectAnalysis, ModelError> {
    let raw: RawAnalysis = parse_validated(text, &ANALYSIS_VALIDATOR)?;

    let risks = raw
        .risks
        .into_iter()
        .map(|risk| Risk {
            description: risk.description,
            category: risk.category,
            level: risk.level,
            eu_act_reference: risk.eu_act_reference.filter(|r| !r.trim().is_empty()),
            confidence_score: risk.confidence_score,
        })
        .collect();

    Ok(ProjectAnalysis::new(
        raw.project_name.trim(),
        raw.description,
        raw.contains_ai.unwrap_or(false),
        raw.ai_confidence.unwrap_or(0.0),
        risks,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_by_level() {
        let text = r#"{
            "project_name": "Gatekeeper",
            "description": "Automated border control.",
            "contains_ai": true,
            "ai_confidence": 0.92,
            "risks": [
                {"description": "Chat assistant", "category": "Transparency", "level": "low"},
                {"description": "Real-time biometric identification", "category": "Prohibited AI",
                 "level": "high", "eu_act_reference": "Article 5", "confidence_score": 0.9}
            ]
        }"#;
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.high_risks.len(), 1);
        assert_eq!(analysis.low_risks.len(), 1);
        assert_eq!(analysis.high_risks[0].reference(), Some("Article 5"));
        assert_eq!(analysis.low_risks[0].level, RiskLevel::Low);
    }

    #[test]
    fn ai_fields_default_when_absent() {
        let text = r#"{"project_name": "Shop", "description": "A web shop.", "risks": []}"#;
        let analysis = parse_analysis(text).unwrap();
        assert!(!analysis.contains_ai);
        assert_eq!(analysis.ai_confidence, 0.0);
        assert_eq!(analysis.total_risks(), 0);
    }

    #[test]
    fn rejects_missing_or_invalid_fields() {
        // no risks array
        assert!(parse_analysis(r#"{"project_name": "X", "description": "Y"}"#).is_err());
        // unknown level
        let bad_level = r#"{"project_name": "X", "description": "Y",
            "risks": [{"description": "d", "category": "c", "level": "medium"}]}"#;
        assert!(parse_analysis(bad_level).is_err());
        // confidence out of range
        let bad_score = r#"{"project_name": "X", "description": "Y", "ai_confidence": 1.7, "risks": []}"#;
        assert!(matches!(parse_analysis(bad_score), Err(ModelError::MalformedOutput(m)) if m.contains("/ai_confidence")));
        let bad_risk_score = r#"{"project_name": "X", "description": "Y", "risks": [
            {"description": "d", "category": "c", "level": "low", "confidence_score": -0.1}]}"#;
        assert!(parse_analysis(bad_risk_score).is_err());
        // blank names and risk descriptions
        assert!(parse_analysis(r#"{"project_name": "  ", "description": "Y", "risks": []}"#).is_err());
        let blank_risk = r#"{"project_name": "X", "description": "Y",
            "risks": [{"description": " ", "category": "c", "level": "high"}]}"#;
        assert!(parse_analysis(blank_risk).is_err());
        assert!(parse_analysis("The project looks fine to me.").is_err());
    }

    #[test]
    fn schema_leaves_ai_fields_optional() {
        let schema = analysis_schema();
        let required: Vec<&str> =
            schema["required"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
        assert_eq!(required, ["project_name", "description", "risks"]);
    }

    #[test]
    fn blank_reference_is_dropped() {
        let text = r#"{"project_name": "X", "description": "Y", "contains_ai": true,
            "risks": [{"description": "d", "category": "c", "level": "high", "eu_act_reference": " "}]}"#;
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.high_risks[0].eu_act_reference, None);
    }
}
