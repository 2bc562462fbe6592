//! Staged repair of almost-JSON produced by language models.
//!
//! Models commonly emit raw line breaks and bare quotes inside string values,
//! forget the comma at the end of a line, or leave one before a closing
//! bracket. Fixing string contents with global substitutions would also hit
//! the grammar around them, so the repair runs in stages:
//!
//! 1. structural tokens around string values are swapped for private-use
//!    marker characters;
//! 2. each value span between an opening marker and the next closing marker is
//!    flattened to one line with its bare quotes escaped;
//! 3. markers are swapped back;
//! 4. missing commas at line ends are inserted;
//! 5. trailing commas are dropped.
//!
//! Every stage runs exactly once.

use regex::{Captures, Regex};
use tracing::{debug, instrument};

/// `"` `:` `"`, the start of a string value.
const OPEN_STRING: char = '\u{E000}';
/// `"` `:` `{`
const OPEN_OBJECT: char = '\u{E001}';
/// `"` `:` `[`
const OPEN_ARRAY: char = '\u{E002}';
/// `"` `:` before a number, literal or anything else.
const COLON: char = '\u{E003}';
/// Closing quote before `,`
const CLOSE_COMMA: char = '\u{E004}';
/// Closing quote before `}`
const CLOSE_BRACE: char = '\u{E005}';
/// Closing quote before `]`
const CLOSE_BRACKET: char = '\u{E006}';

const MARKERS: [(char, &str); 7] = [
    (OPEN_STRING, "\": \""),
    (OPEN_OBJECT, "\": {"),
    (OPEN_ARRAY, "\": ["),
    (COLON, "\": "),
    (CLOSE_COMMA, "\","),
    (CLOSE_BRACE, "\"}"),
    (CLOSE_BRACKET, "\"]"),
];

fn is_marker(c: char) -> bool {
    ('\u{E000}'..='\u{E006}').contains(&c)
}

/// Single-pass JSON repairer.
///
/// Compiles its patterns once; share one instance across parses.
///
/// # Examples
///
/// ```
/// use sibyl_analysis::JsonRepair;
///
/// let broken = "{\"a\": \"two\nlines\", \"b\": 1,}";
/// let fixed = JsonRepair::new().repair(broken);
/// assert_eq!(fixed, "{\"a\": \"two lines\", \"b\": 1}");
/// ```
#[derive(Debug, Clone)]
pub struct JsonRepair {
    open_object: Regex,
    open_array: Regex,
    open_string: Regex,
    colon: Regex,
    close_comma: Regex,
    close_brace: Regex,
    close_bracket: Regex,
    string_span: Regex,
    missing_comma: Regex,
    trailing_comma: Regex,
}

impl Default for JsonRepair {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepair {
    /// Compile the repair patterns.
    pub fn new() -> Self {
        Self {
            open_object: Regex::new(r#""\s*:\s*\{"#).expect("Valid open-object regex"),
            open_array: Regex::new(r#""\s*:\s*\["#).expect("Valid open-array regex"),
            open_string: Regex::new(r#""\s*:\s*""#).expect("Valid open-string regex"),
            colon: Regex::new(r#""\s*:\s*"#).expect("Valid colon regex"),
            // A closing quote must not itself be escaped
            close_comma: Regex::new(r#"(^|[^\\])"\s*,"#).expect("Valid close-comma regex"),
            close_brace: Regex::new(r#"(^|[^\\])"\s*\}"#).expect("Valid close-brace regex"),
            close_bracket: Regex::new(r#"(^|[^\\])"\s*\]"#).expect("Valid close-bracket regex"),
            string_span: Regex::new(r"\x{E000}([^\x{E000}-\x{E006}]*)([\x{E004}-\x{E006}])")
                .expect("Valid string-span regex"),
            missing_comma: Regex::new(r#"(\d|true|false|null|"|\}|\])[ \t\r]*\n(\s*)""#)
                .expect("Valid missing-comma regex"),
            trailing_comma: Regex::new(r",(\s*[}\]])").expect("Valid trailing-comma regex"),
        }
    }

    /// Apply every repair stage once.
    ///
    /// The result is not guaranteed to be valid JSON; callers re-parse it.
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn repair(&self, text: &str) -> String {
        let strings_fixed = if text.contains(is_marker) {
            // Input already uses the marker range; protecting would corrupt it
            debug!("Skipping string repair, input contains marker characters");
            text.to_string()
        } else {
            let protected = self.protect(text);
            let cleaned = self.clean_strings(&protected);
            restore(&cleaned)
        };

        let with_commas = self
            .missing_comma
            .replace_all(&strings_fixed, "${1},\n${2}\"");
        let repaired = self.trailing_comma.replace_all(&with_commas, "${1}");

        debug!(repaired_len = repaired.len(), "Repair pass complete");
        repaired.into_owned()
    }

    fn protect(&self, text: &str) -> String {
        let text = self
            .open_object
            .replace_all(text, OPEN_OBJECT.to_string().as_str());
        let text = self
            .open_array
            .replace_all(&text, OPEN_ARRAY.to_string().as_str());
        let text = self
            .open_string
            .replace_all(&text, OPEN_STRING.to_string().as_str());
        let text = self.colon.replace_all(&text, COLON.to_string().as_str());
        let text = self
            .close_comma
            .replace_all(&text, format!("${{1}}{}", CLOSE_COMMA).as_str());
        let text = self
            .close_brace
            .replace_all(&text, format!("${{1}}{}", CLOSE_BRACE).as_str());
        let text = self
            .close_bracket
            .replace_all(&text, format!("${{1}}{}", CLOSE_BRACKET).as_str());
        text.into_owned()
    }

    fn clean_strings(&self, protected: &str) -> String {
        self.string_span
            .replace_all(protected, |caps: &Captures| {
                format!("{}{}{}", OPEN_STRING, clean_value(&caps[1]), &caps[2])
            })
            .into_owned()
    }
}

fn restore(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match MARKERS.iter().find(|(marker, _)| *marker == c) {
            Some((_, token)) => out.push_str(token),
            None => out.push(c),
        }
    }
    out
}

/// Flatten line breaks, collapse whitespace runs and escape bare quotes.
fn clean_value(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repair(text: &str) -> String {
        JsonRepair::new().repair(text)
    }

    #[test]
    fn test_clean_value_escapes_only_bare_quotes() {
        assert_eq!(clean_value(r#"a "b" \"c\""#), r#"a \"b\" \"c\""#);
        assert_eq!(clean_value(r"path\\"), r"path\\");
    }

    #[test]
    fn test_clean_value_collapses_whitespace() {
        assert_eq!(clean_value("  one\r\n\n two\t three  "), "one two three");
    }

    #[test]
    fn test_valid_json_survives() {
        let json = r#"{"a": "x", "b": {"c": [1, 2]}, "d": true}"#;
        let repaired = repair(json);
        let before: serde_json::Value = serde_json::from_str(json).unwrap();
        let after: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_raw_newline_in_value() {
        let repaired = repair("{\"a\": \"line one\nline two\"}");
        assert_eq!(repaired, "{\"a\": \"line one line two\"}");
    }

    #[test]
    fn test_bare_quotes_in_value() {
        let repaired = repair(r#"{"a": "the "architect" type"}"#);
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["a"], r#"the "architect" type"#);
    }

    #[test]
    fn test_missing_comma_after_each_value_kind() {
        let repaired = repair("{\n\"a\": 1\n\"b\": true\n\"c\": {}\n\"d\": []\n\"e\": \"x\"\n\"f\": null\n}");
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_trailing_commas() {
        let repaired = repair("{\"a\": [1, 2,], \"b\": {\"c\": 3,},}");
        assert_eq!(repaired, "{\"a\": [1, 2], \"b\": {\"c\": 3}}");
    }

    #[test]
    fn test_marker_characters_in_input_skip_string_stage() {
        let text = "{\"a\": \"\u{E000}\",}";
        assert_eq!(repair(text), "{\"a\": \"\u{E000}\"}");
    }
}
