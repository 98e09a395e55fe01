//! Pluggable narrative generation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::Result;

/// An optional external capability that turns an analysis prompt into text,
/// ideally containing one JSON object shaped like
/// [`ValidatedInsights`](crate::domain::ValidatedInsights).
pub trait InsightGenerator: Send + Sync {
    fn try_generate(&self, prompt: &str) -> Result<String>;
}

static JSON_OBJECT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").ok());

/// Pulls the outermost `{...}` block out of free text and parses it.
pub fn extract_insights(text: &str) -> Option<Value> {
    let pattern = JSON_OBJECT.as_ref()?;
    let candidate = pattern.find(text)?;
    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(error = %err, "generated insights are not valid json");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let text = "Here is your analysis:\n{\"keyInsights\": [\"Rent dominated this month\"]}\nThanks!";
        let value = extract_insights(text).unwrap();
        assert_eq!(value["keyInsights"][0], "Rent dominated this month");
    }

    #[test]
    fn spans_nested_objects() {
        let text = "{\"recommendations\": {\"immediate\": [\"Cook at home more often\"]}}";
        let value = extract_insights(text).unwrap();
        assert!(value["recommendations"]["immediate"].is_array());
    }

    #[test]
    fn rejects_text_without_valid_json() {
        assert!(extract_insights("no structured answer today").is_none());
        assert!(extract_insights("{ keyInsights: [unquoted] }").is_none());
    }
}
