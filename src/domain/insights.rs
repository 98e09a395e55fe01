use serde::{Deserialize, Serialize};

/// Narrative commentary attached to a report.
///
/// Field names follow the JSON shape requested from the insight generator so a
/// well-formed external answer and the stored value look the same.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedInsights {
    pub key_insights: Vec<String>,
    pub spending_behavior: String,
    pub recommendations: Recommendations,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub budget_alert: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub long_term: Vec<String>,
}
