//! Validated analysis results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scored axis of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Dimension {
    /// Dominant pole letter, when the model reported one
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pole: Option<String>,
    /// Strength of the dominant pole
    percentage: f64,
    /// Commentary
    analysis: String,
}

impl Dimension {
    /// Create a dimension. Range checks happen in the parser.
    pub fn new(pole: Option<String>, percentage: f64, analysis: impl Into<String>) -> Self {
        Self {
            pole,
            percentage,
            analysis: analysis.into(),
        }
    }
}

/// A validated analysis recovered from a model response.
///
/// Produced once by [`ResponseRepairParser::parse`](crate::ResponseRepairParser::parse)
/// and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StructuredResult {
    /// Categorical code, one letter per axis
    code: String,
    /// Scored dimensions by name
    dimensions: BTreeMap<String, Dimension>,
    /// Free-form summary
    summary: String,
    /// Top-level keys beyond the required ones, kept verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extras: BTreeMap<String, serde_json::Value>,
}

impl StructuredResult {
    pub(crate) fn new(
        code: String,
        dimensions: BTreeMap<String, Dimension>,
        summary: String,
        extras: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            code,
            dimensions,
            summary,
            extras,
        }
    }

    /// Look up a dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.get(name)
    }
}
