//! Parser configuration: required keys, code alphabet and score range.

use serde::{Deserialize, Serialize};

/// Per-position alphabet for the categorical code.
///
/// Each position of the code is one binary axis with exactly two allowed
/// letters. The default is the four MBTI axes, so valid codes match
/// `^[EI][SN][TF][JP]$`.
///
/// # Examples
///
/// ```
/// use sibyl_analysis::CodeAlphabet;
///
/// let alphabet = CodeAlphabet::default();
/// assert!(alphabet.matches("INTJ"));
/// assert!(!alphabet.matches("ABCD"));
/// assert!(!alphabet.matches("intj"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeAlphabet(Vec<[char; 2]>);

impl Default for CodeAlphabet {
    fn default() -> Self {
        Self(vec![['E', 'I'], ['S', 'N'], ['T', 'F'], ['J', 'P']])
    }
}

impl CodeAlphabet {
    /// Alphabet from explicit axes.
    pub fn new(axes: Vec<[char; 2]>) -> Self {
        Self(axes)
    }

    /// The axes, in code order.
    pub fn axes(&self) -> &[[char; 2]] {
        &self.0
    }

    /// Whether `code` has one allowed letter per axis and nothing else.
    pub fn matches(&self, code: &str) -> bool {
        code.chars().count() == self.0.len()
            && code
                .chars()
                .zip(&self.0)
                .all(|(c, axis)| axis.contains(&c))
    }

    /// Whether `letter` is a pole of any axis.
    pub fn contains(&self, letter: char) -> bool {
        self.0.iter().any(|axis| axis.contains(&letter))
    }
}

/// Shape contract for a model response.
///
/// # Examples
///
/// ```
/// use sibyl_analysis::ParserConfig;
///
/// let config = ParserConfig::builder()
///     .summary_key("summary")
///     .build();
///
/// assert_eq!(config.code_key(), "mbti_type"); // Default
/// assert_eq!(config.required_keys(), ["mbti_type", "dimensions", "summary"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ParserConfig {
    /// Key holding the categorical code.
    #[serde(default = "default_code_key")]
    code_key: String,
    /// Key holding the per-dimension mapping.
    #[serde(default = "default_dimensions_key")]
    dimensions_key: String,
    /// Key holding the free-form summary.
    #[serde(default = "default_summary_key")]
    summary_key: String,
    /// Allowed letters per code position.
    #[serde(default)]
    alphabet: CodeAlphabet,
    /// Lowest accepted dimension percentage.
    #[serde(default = "default_min_percentage")]
    min_percentage: f64,
    /// Highest accepted dimension percentage.
    #[serde(default = "default_max_percentage")]
    max_percentage: f64,
}

fn default_code_key() -> String {
    "mbti_type".to_string()
}

fn default_dimensions_key() -> String {
    "dimensions".to_string()
}

fn default_summary_key() -> String {
    "overall_analysis".to_string()
}

fn default_min_percentage() -> f64 {
    50.0
}

fn default_max_percentage() -> f64 {
    100.0
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            code_key: default_code_key(),
            dimensions_key: default_dimensions_key(),
            summary_key: default_summary_key(),
            alphabet: CodeAlphabet::default(),
            min_percentage: default_min_percentage(),
            max_percentage: default_max_percentage(),
        }
    }
}

impl ParserConfig {
    /// Creates a new parser config builder.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }

    /// Top-level keys every payload must contain, in validation order.
    pub fn required_keys(&self) -> [&str; 3] {
        [
            self.code_key.as_str(),
            self.dimensions_key.as_str(),
            self.summary_key.as_str(),
        ]
    }
}

/// Builder for `ParserConfig`.
#[derive(Debug, Default)]
pub struct ParserConfigBuilder {
    code_key: Option<String>,
    dimensions_key: Option<String>,
    summary_key: Option<String>,
    alphabet: Option<CodeAlphabet>,
    min_percentage: Option<f64>,
    max_percentage: Option<f64>,
}

impl ParserConfigBuilder {
    /// Sets the categorical code key.
    pub fn code_key(mut self, value: impl Into<String>) -> Self {
        self.code_key = Some(value.into());
        self
    }

    /// Sets the dimensions key.
    pub fn dimensions_key(mut self, value: impl Into<String>) -> Self {
        self.dimensions_key = Some(value.into());
        self
    }

    /// Sets the summary key.
    pub fn summary_key(mut self, value: impl Into<String>) -> Self {
        self.summary_key = Some(value.into());
        self
    }

    /// Sets the code alphabet.
    pub fn alphabet(mut self, value: CodeAlphabet) -> Self {
        self.alphabet = Some(value);
        self
    }

    /// Sets the accepted percentage range, inclusive.
    pub fn percentage_range(mut self, min: f64, max: f64) -> Self {
        self.min_percentage = Some(min);
        self.max_percentage = Some(max);
        self
    }

    /// Builds the `ParserConfig`, filling unset fields with defaults.
    pub fn build(self) -> ParserConfig {
        let defaults = ParserConfig::default();
        ParserConfig {
            code_key: self.code_key.unwrap_or(defaults.code_key),
            dimensions_key: self.dimensions_key.unwrap_or(defaults.dimensions_key),
            summary_key: self.summary_key.unwrap_or(defaults.summary_key),
            alphabet: self.alphabet.unwrap_or(defaults.alphabet),
            min_percentage: self.min_percentage.unwrap_or(defaults.min_percentage),
            max_percentage: self.max_percentage.unwrap_or(defaults.max_percentage),
        }
    }
}
