use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::parser::Parser;

pub const FUNCTION_PREFIX: &str = "__function:";

/// A decoded accessor: the dot-separated steps of `%(type.id)` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Path {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// `name`
    Field { name: String },
    /// `name:extract[k1=v1&k2=v2]`: pick one record of the array at `name`
    /// and take its `extract` field.
    Filtered {
        name: String,
        extract: String,
        conditions: Vec<Condition>,
    },
    /// `__function:name` or `__function:name[params]`, params kept verbatim.
    Function { name: String, params: Option<String> },
}

/// One constraint of a filtered step: `key=value` for string equality, or a
/// bare `key` for a record that has no `key` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub key: String,
    pub value: Option<String>,
}

impl Path {
    /// Parse the text between `%(` and `)`.
    pub fn parse(inner: &str) -> Self {
        let steps = Parser::new(inner)
            .split_top_level('.')
            .into_iter()
            .map(Step::parse)
            .collect();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Step {
    pub fn parse(segment: &str) -> Self {
        let mut p = Parser::new(segment);
        if p.consume_str(FUNCTION_PREFIX) {
            let name = p.capture_until('[').to_string();
            let params = p.capture_bracketed().map(str::to_string);
            return Step::Function { name, params };
        }
        if !segment.contains(':') {
            return Step::Field {
                name: segment.to_string(),
            };
        }
        let name = p.capture_until(':').to_string();
        p.consume_char(':');
        let extract = p.capture_until('[').to_string();
        let conditions = p.capture_bracketed().map(parse_conditions).unwrap_or_default();
        Step::Filtered {
            name,
            extract,
            conditions,
        }
    }
}

/// `rel=self&lang=en` -> [(rel, self), (lang, en)]. Pieces split on the first `=`;
/// a piece without `=` has no value. Empty pieces are dropped.
fn parse_conditions(text: &str) -> Vec<Condition> {
    text.split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| match piece.split_once('=') {
            Some((key, value)) => Condition {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => Condition {
                key: piece.to_string(),
                value: None,
            },
        })
        .collect()
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.key),
            None => f.write_str(&self.key),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Field { name } => f.write_str(name),
            Step::Filtered {
                name,
                extract,
                conditions,
            } => {
                write!(f, "{name}:{extract}")?;
                if !conditions.is_empty() {
                    write!(f, "[{}]", conditions.iter().join("&"))?;
                }
                Ok(())
            }
            Step::Function { name, params } => {
                write!(f, "{FUNCTION_PREFIX}{name}")?;
                if let Some(params) = params {
                    write!(f, "[{params}]")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.iter().join("."))
    }
}
