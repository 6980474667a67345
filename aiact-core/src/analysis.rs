//! Data types for the structured result of one document analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk classification under the EU AI Act, as assigned by the generation model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// High-risk or prohibited practice.
    High,
    /// Limited or minimal risk.
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Low => write!(f, "low"),
        }
    }
}

/// A single risk extracted by the generation model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Risk {
    /// What the risk is.
    pub description: String,
    /// EU AI Act category, e.g. "Prohibited AI" or "High-Risk AI".
    pub category: String,
    /// The model-assigned level.
    pub level: RiskLevel,
    /// Article or annex the model cites, e.g. "Article 5".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eu_act_reference: Option<String>,
    /// Model confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl Risk {
    /// The cited reference, if it is present and not blank.
    pub fn reference(&self) -> Option<&str> {
        self.eu_act_reference.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// Aggregate result of analysing one technical document.
///
/// Produced once by the extraction pipeline and never modified afterwards.
/// `high_risks` only ever holds [`RiskLevel::High`] entries and `low_risks`
/// only [`RiskLevel::Low`] ones; use [`ProjectAnalysis::new`] to build one
/// from an unordered list of risks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectAnalysis {
    /// Project name extracted or inferred from the document.
    pub project_name: String,
    /// Short description of the project.
    pub description: String,
    /// Whether the project contains AI/ML components.
    pub contains_ai: bool,
    /// Confidence of the AI detection in `[0, 1]`.
    pub ai_confidence: f64,
    /// Risks the model classified as high.
    #[serde(default)]
    pub high_risks: Vec<Risk>,
    /// Risks the model classified as low.
    #[serde(default)]
    pub low_risks: Vec<Risk>,
}

impl ProjectAnalysis {
    /// Build an analysis, partitioning `risks` by their model-assigned level.
    pub fn new(
        project_name: impl Into<String>,
        description: impl Into<String>,
        contains_ai: bool,
        ai_confidence: f64,
        risks: Vec<Risk>,
    ) -> Self {
        let (high_risks, low_risks) =
            risks.into_iter().partition(|risk| risk.level == RiskLevel::High);
        Self {
            project_name: project_name.into(),
            description: description.into(),
            contains_ai,
            ai_confidence,
            high_risks,
            low_risks,
        }
    }

    /// All risks, high first.
    pub fn risks(&self) -> impl Iterator<Item = &Risk> {
        self.high_risks.iter().chain(self.low_risks.iter())
    }

    pub fn total_risks(&self) -> usize {
        self.high_risks.len() + self.low_risks.len()
    }

    pub fn high_risk_count(&self) -> usize {
        self.high_risks.len()
    }

    pub fn low_risk_count(&self) -> usize {
        self.low_risks.len()
    }
}
