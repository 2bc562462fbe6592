//! Response repair parser.

use crate::{Dimension, JsonRepair, ParserConfig, StructuredResult, locate_payload};
use serde_json::{Map, Value};
use sibyl_error::{ParseError, ParseErrorKind};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Recovers a [`StructuredResult`] from raw model output.
///
/// Parsing is bounded: one payload span, at most one repair pass, and any
/// failure after that is returned rather than retried. Whether to ask the model
/// again is the caller's decision.
///
/// # Examples
///
/// ```
/// use sibyl_analysis::ResponseRepairParser;
/// use sibyl_error::ParseErrorKind;
///
/// let parser = ResponseRepairParser::default();
///
/// let raw = r#"{"mbti_type": "ABCD", "dimensions": {}, "overall_analysis": "x"}"#;
/// let err = parser.parse(raw).unwrap_err();
/// assert!(matches!(err.kind, ParseErrorKind::InvalidCode(_)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseRepairParser {
    config: ParserConfig,
    repair: JsonRepair,
}

impl ResponseRepairParser {
    /// Create a parser for the given shape contract.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            repair: JsonRepair::new(),
        }
    }

    /// The shape contract.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Extract, repair and validate the payload in `raw`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying the first 500 characters of `raw` when
    /// no payload is found, the payload is not valid JSON after repair, a
    /// required key is missing, the code is outside the alphabet, or a
    /// dimension is malformed.
    #[instrument(skip_all, fields(raw_len = raw.len()))]
    pub fn parse(&self, raw: &str) -> Result<StructuredResult, ParseError> {
        let Some(payload) = locate_payload(raw) else {
            warn!("No JSON payload found in response");
            return Err(ParseError::new(ParseErrorKind::MissingPayload, raw));
        };
        debug!(payload_len = payload.len(), "Located payload");

        let object = self.decode(payload, raw)?;
        let result = self.validate(object, raw)?;

        debug!(
            code = %result.code(),
            dimensions = result.dimensions().len(),
            "Parsed structured result"
        );
        Ok(result)
    }

    /// Strict parse, then one repair attempt.
    fn decode(&self, payload: &str, raw: &str) -> Result<Map<String, Value>, ParseError> {
        let value = match serde_json::from_str::<Value>(payload) {
            Ok(value) => value,
            Err(strict) => {
                debug!(error = %strict, "Strict parse failed, repairing");
                let repaired = self.repair.repair(payload);
                serde_json::from_str::<Value>(&repaired).map_err(|e| {
                    warn!(error = %e, "Payload still invalid after repair");
                    ParseError::new(ParseErrorKind::InvalidJson(e.to_string()), raw)
                })?
            }
        };

        match value {
            Value::Object(object) => Ok(object),
            other => Err(ParseError::new(
                ParseErrorKind::InvalidJson(format!(
                    "expected an object, found {}",
                    json_type(&other)
                )),
                raw,
            )),
        }
    }

    fn validate(
        &self,
        mut object: Map<String, Value>,
        raw: &str,
    ) -> Result<StructuredResult, ParseError> {
        for key in self.config.required_keys() {
            if !object.contains_key(key) {
                warn!(key, "Required field missing");
                return Err(ParseError::new(
                    ParseErrorKind::MissingKey(key.to_string()),
                    raw,
                ));
            }
        }

        let code = match object.remove(self.config.code_key()) {
            Some(Value::String(code)) if self.config.alphabet().matches(&code) => code,
            Some(Value::String(code)) => {
                return Err(ParseError::new(ParseErrorKind::InvalidCode(code), raw));
            }
            other => {
                let shown = other.map(|v| v.to_string()).unwrap_or_default();
                return Err(ParseError::new(ParseErrorKind::InvalidCode(shown), raw));
            }
        };

        let dimensions = match object.remove(self.config.dimensions_key()) {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .map(|(name, value)| -> Result<(String, Dimension), ParseError> {
                    let dimension = self
                        .dimension(&name, value)
                        .map_err(|reason| {
                            ParseError::new(
                                ParseErrorKind::InvalidDimension {
                                    name: name.clone(),
                                    reason,
                                },
                                raw,
                            )
                        })?;
                    Ok((name, dimension))
                })
                .collect::<Result<BTreeMap<_, _>, ParseError>>()?,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidField {
                        name: self.config.dimensions_key().clone(),
                        reason: format!(
                            "expected an object, found {}",
                            other.as_ref().map_or("nothing", json_type)
                        ),
                    },
                    raw,
                ));
            }
        };

        let summary = match object.remove(self.config.summary_key()) {
            Some(Value::String(summary)) => summary,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidField {
                        name: self.config.summary_key().clone(),
                        reason: format!(
                            "expected a string, found {}",
                            other.as_ref().map_or("nothing", json_type)
                        ),
                    },
                    raw,
                ));
            }
        };

        let extras: BTreeMap<String, Value> = object.into_iter().collect();
        Ok(StructuredResult::new(code, dimensions, summary, extras))
    }

    /// Check one dimension entry; the error is the reason it was rejected.
    fn dimension(&self, name: &str, value: Value) -> Result<Dimension, String> {
        let mut entry = match value {
            Value::Object(entry) => entry,
            other => return Err(format!("expected an object, found {}", json_type(&other))),
        };

        let percentage = match entry.get("percentage") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| format!("percentage {} is not representable", n))?,
            Some(other) => {
                return Err(format!(
                    "percentage must be a number, found {}",
                    json_type(other)
                ));
            }
            None => return Err("missing percentage".to_string()),
        };
        let (min, max) = (*self.config.min_percentage(), *self.config.max_percentage());
        if !(min..=max).contains(&percentage) {
            return Err(format!(
                "percentage {} outside [{}, {}]",
                percentage, min, max
            ));
        }

        let analysis = match entry.remove("analysis") {
            Some(Value::String(analysis)) => analysis,
            Some(other) => {
                return Err(format!(
                    "analysis must be a string, found {}",
                    json_type(&other)
                ));
            }
            None => return Err("missing analysis".to_string()),
        };

        let pole = match entry.remove("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(pole)) => {
                let mut letters = pole.chars();
                match (letters.next(), letters.next()) {
                    (Some(letter), None) if self.config.alphabet().contains(letter) => Some(pole),
                    _ => return Err(format!("unknown pole {:?}", pole)),
                }
            }
            Some(other) => {
                return Err(format!("type must be a string, found {}", json_type(&other)));
            }
        };

        debug!(dimension = name, percentage, "Validated dimension");
        Ok(Dimension::new(pole, percentage, analysis))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(value: Value) -> Result<Dimension, String> {
        ResponseRepairParser::default().dimension("E_I", value)
    }

    #[test]
    fn test_dimension_bounds_are_inclusive() {
        for pct in [50, 100] {
            let d = dimension(serde_json::json!({"percentage": pct, "analysis": "ok"})).unwrap();
            assert_eq!(*d.percentage(), f64::from(pct));
        }
        assert!(dimension(serde_json::json!({"percentage": 49.9, "analysis": "ok"})).is_err());
        assert!(dimension(serde_json::json!({"percentage": 100.5, "analysis": "ok"})).is_err());
    }

    #[test]
    fn test_dimension_requires_numeric_percentage() {
        let err = dimension(serde_json::json!({"percentage": "85", "analysis": "ok"})).unwrap_err();
        assert!(err.contains("must be a number"));
    }

    #[test]
    fn test_dimension_requires_analysis_text() {
        let err = dimension(serde_json::json!({"percentage": 80})).unwrap_err();
        assert_eq!(err, "missing analysis");
    }

    #[test]
    fn test_dimension_pole_must_be_in_alphabet() {
        let ok = dimension(serde_json::json!({"type": "I", "percentage": 80, "analysis": "a"}));
        assert_eq!(ok.unwrap().pole().as_deref(), Some("I"));

        let bad = dimension(serde_json::json!({"type": "X", "percentage": 80, "analysis": "a"}));
        assert!(bad.unwrap_err().contains("unknown pole"));
    }

    #[test]
    fn test_dimension_must_be_object() {
        assert!(dimension(serde_json::json!(80)).unwrap_err().contains("a number"));
    }
}
