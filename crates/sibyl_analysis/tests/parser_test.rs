//! Tests for recovering structured results from model output.

use sibyl_analysis::{CodeAlphabet, ParserConfig, ResponseRepairParser};
use sibyl_error::ParseErrorKind;

fn parser() -> ResponseRepairParser {
    ResponseRepairParser::default()
}

#[test]
fn test_fenced_payload() {
    let raw = "```json\n{\"mbti_type\": \"INTJ\", \"dimensions\": {}, \"overall_analysis\": \"x\"}\n```";
    let result = parser().parse(raw).unwrap();

    assert_eq!(result.code(), "INTJ");
    assert!(result.dimensions().is_empty());
    assert_eq!(result.summary(), "x");
}

#[test]
fn test_full_response_with_prose() {
    let raw = r#"Based on the timeline, here is my assessment:

```json
{
  "mbti_type": "ENFP",
  "dimensions": {
    "E_I": {"type": "E", "percentage": 78, "analysis": "Replies to everyone."},
    "S_N": {"type": "N", "percentage": 64.5, "analysis": "Lots of what-ifs."},
    "T_F": {"type": "F", "percentage": 70, "analysis": "Warm tone."},
    "J_P": {"type": "P", "percentage": 81, "analysis": "Posts at all hours."}
  },
  "overall_analysis": "An enthusiastic connector.",
  "confidence": "high"
}
```

Let me know if you need more detail."#;

    let result = parser().parse(raw).unwrap();
    assert_eq!(result.code(), "ENFP");
    assert_eq!(result.dimensions().len(), 4);

    let s_n = result.dimension("S_N").unwrap();
    assert_eq!(s_n.pole().as_deref(), Some("N"));
    assert_eq!(*s_n.percentage(), 64.5);
    assert_eq!(s_n.analysis(), "Lots of what-ifs.");

    assert_eq!(result.extras()["confidence"], "high");
}

#[test]
fn test_bare_braces_without_fence() {
    let raw = "Result: {\"mbti_type\": \"ISTP\", \"dimensions\": {}, \"overall_analysis\": \"quiet\"} done";
    assert_eq!(parser().parse(raw).unwrap().code(), "ISTP");
}

#[test]
fn test_raw_newline_inside_summary() {
    let raw = "{\"mbti_type\": \"INTJ\", \"dimensions\": {}, \"overall_analysis\": \"line one\nline two\"}";
    let result = parser().parse(raw).unwrap();
    assert_eq!(result.summary(), "line one line two");
}

#[test]
fn test_repairs_multiline_analysis_and_missing_comma() {
    let raw = "```json
{
  \"mbti_type\": \"ENFP\",
  \"dimensions\": {
    \"E_I\": {
      \"type\": \"E\",
      \"percentage\": 72
      \"analysis\": \"Posts constantly
about   meetups\"
    }
  },
  \"overall_analysis\": \"Warm.\",
}
```";
    let result = parser().parse(raw).unwrap();

    let e_i = result.dimension("E_I").unwrap();
    assert_eq!(*e_i.percentage(), 72.0);
    assert_eq!(e_i.analysis(), "Posts constantly about meetups");
    assert_eq!(result.summary(), "Warm.");
}

#[test]
fn test_repairs_bare_quotes_in_summary() {
    let raw = r#"{"mbti_type": "INTP", "dimensions": {}, "overall_analysis": "A true "architect" of ideas"}"#;
    let result = parser().parse(raw).unwrap();
    assert_eq!(result.summary(), r#"A true "architect" of ideas"#);
}

#[test]
fn test_repairs_trailing_commas() {
    let raw = r#"{"mbti_type": "ESTJ", "dimensions": {"J_P": {"percentage": 90, "analysis": "Plans",},}, "overall_analysis": "Organised",}"#;
    let result = parser().parse(raw).unwrap();
    assert_eq!(result.code(), "ESTJ");
    assert_eq!(*result.dimension("J_P").unwrap().percentage(), 90.0);
}

#[test]
fn test_invalid_code_rejected() {
    let raw = r#"{"mbti_type": "ABCD", "dimensions": {}, "overall_analysis": "x"}"#;
    let err = parser().parse(raw).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidCode("ABCD".to_string()));
}

#[test]
fn test_lowercase_code_rejected() {
    let raw = r#"{"mbti_type": "intj", "dimensions": {}, "overall_analysis": "x"}"#;
    assert!(matches!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::InvalidCode(_)
    ));
}

#[test]
fn test_non_string_code_rejected() {
    let raw = r#"{"mbti_type": 4, "dimensions": {}, "overall_analysis": "x"}"#;
    assert_eq!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::InvalidCode("4".to_string())
    );
}

#[test]
fn test_no_payload() {
    let raw = "I'm sorry, I can't analyse this account.";
    let err = parser().parse(raw).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MissingPayload);
    assert_eq!(err.excerpt, raw);
}

#[test]
fn test_missing_key_reported_in_order() {
    let raw = r#"{"dimensions": {}}"#;
    assert_eq!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::MissingKey("mbti_type".to_string())
    );

    let raw = r#"{"mbti_type": "INTJ", "dimensions": {}}"#;
    assert_eq!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::MissingKey("overall_analysis".to_string())
    );
}

#[test]
fn test_percentage_out_of_range_rejected() {
    let raw = r#"{"mbti_type": "INTJ", "dimensions": {"E_I": {"type": "I", "percentage": 42, "analysis": "x"}}, "overall_analysis": "x"}"#;
    let err = parser().parse(raw).unwrap_err();
    match err.kind {
        ParseErrorKind::InvalidDimension { name, reason } => {
            assert_eq!(name, "E_I");
            assert!(reason.contains("42"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_dimensions_must_be_object() {
    let raw = r#"{"mbti_type": "INTJ", "dimensions": [], "overall_analysis": "x"}"#;
    assert!(matches!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::InvalidField { ref name, .. } if name == "dimensions"
    ));
}

#[test]
fn test_unrepairable_payload_is_invalid_json() {
    let raw = "{\"mbti_type\": \"INTJ\", \"dimensions\": {{{ }";
    assert!(matches!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::InvalidJson(_)
    ));
}

#[test]
fn test_top_level_array_rejected() {
    let raw = "```json\n[{\"mbti_type\": \"INTJ\"}]\n```";
    assert!(matches!(
        parser().parse(raw).unwrap_err().kind,
        ParseErrorKind::InvalidJson(_)
    ));
}

#[test]
fn test_excerpt_is_truncated() {
    let raw = format!("no json here {}", "x".repeat(1000));
    let err = parser().parse(&raw).unwrap_err();
    assert_eq!(err.excerpt.chars().count(), 503);
    assert!(err.excerpt.ends_with("..."));
}

#[test]
fn test_custom_contract() {
    let config = ParserConfig::builder()
        .code_key("code")
        .summary_key("summary")
        .alphabet(CodeAlphabet::new(vec![['A', 'B'], ['X', 'Y']]))
        .percentage_range(0.0, 1.0)
        .build();
    let parser = ResponseRepairParser::new(config);

    let raw = r#"{"code": "BX", "dimensions": {"first": {"type": "B", "percentage": 0.7, "analysis": "ok"}}, "summary": "fine"}"#;
    let result = parser.parse(raw).unwrap();
    assert_eq!(result.code(), "BX");
    assert_eq!(result.summary(), "fine");
}

#[test]
fn test_result_serializes_with_type_key() {
    let raw = r#"{"mbti_type": "INTJ", "dimensions": {"E_I": {"type": "I", "percentage": 80, "analysis": "x"}}, "overall_analysis": "y"}"#;
    let result = parser().parse(raw).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["dimensions"]["E_I"]["type"], "I");
    assert_eq!(json["code"], "INTJ");
    assert!(json.get("extras").is_none());
}
