use serde::Deserialize;

use crate::errors::Result;

/// How resolved values are spliced back into a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// One left-to-right pass over the token spans found while decoding.
    /// Resolved text is never scanned again.
    #[default]
    SinglePass,
    /// Progressive find-and-replace-all per distinct token, in first-appearance
    /// order. A resolved value that contains a later token's text gets replaced too.
    ReplaceAll,
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub substitution: Substitution,
    /// Text written for values that resolve to nothing (absent or null).
    pub undefined_text: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            substitution: Substitution::SinglePass,
            undefined_text: "undefined".to_string(),
        }
    }
}

impl Options {
    /// Parse options from a JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
