use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::path::Condition;

/// Result of narrowing an array down to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<'a> {
    /// A record was picked; this is its `extract` field (`None` if the record lacks it).
    Selected(Option<&'a Value>),
    /// Nothing usable was found, or the input was not an array. Carries the input.
    Unchanged(&'a Value),
}

impl<'a> FilterOutcome<'a> {
    /// The value a caller continues with: the extracted field or the untouched input.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            FilterOutcome::Selected(v) => *v,
            FilterOutcome::Unchanged(v) => Some(v),
        }
    }
}

/// Pick a single record out of `records` and return its `extract` field.
///
/// With no conditions the first record whose `extract` field is truthy wins.
/// Otherwise every `key=value` pair must hold as plain string equality and every
/// bare `key` must be absent from the record; ties go to
/// the first match in array order. Never fails: anything unusable comes back as
/// [`FilterOutcome::Unchanged`] with a diagnostic sent to `sink`. `accessor` is
/// only used to label those diagnostics.
pub fn filter_one<'a>(
    records: &'a Value,
    extract: &str,
    conditions: &[Condition],
    accessor: &str,
    sink: &dyn DiagnosticSink,
) -> FilterOutcome<'a> {
    let Value::Array(items) = records else {
        sink.report(Diagnostic::new(
            DiagnosticKind::MalformedArrayInput,
            accessor,
            format!("cannot filter non-array value {records}"),
        ));
        return FilterOutcome::Unchanged(records);
    };

    if conditions.is_empty() {
        return match items.iter().find(|r| r.get(extract).is_some_and(truthy)) {
            Some(record) => {
                let picked = record.get(extract);
                sink.report(Diagnostic::new(
                    DiagnosticKind::BestGuess,
                    accessor,
                    format!(
                        "no conditionals given, returning best guess {}",
                        display_opt(picked)
                    ),
                ));
                FilterOutcome::Selected(picked)
            }
            None => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::NoFilterMatch,
                    accessor,
                    format!("no record carries a value for `{extract}`"),
                ));
                FilterOutcome::Unchanged(records)
            }
        };
    }

    tracing::debug!(accessor, conditions = conditions.len(), "applying conditional filter");
    let matches: Vec<&Value> = items
        .iter()
        .filter(|r| conditions.iter().all(|c| satisfies(r, c)))
        .collect();

    match matches.as_slice() {
        [] => {
            sink.report(Diagnostic::new(
                DiagnosticKind::NoFilterMatch,
                accessor,
                "no records matched the filter",
            ));
            FilterOutcome::Unchanged(records)
        }
        [only] => {
            let picked = only.get(extract);
            tracing::debug!(accessor, value = %display_opt(picked), "unique filter match");
            FilterOutcome::Selected(picked)
        }
        [first, rest @ ..] => {
            let picked = first.get(extract);
            sink.report(Diagnostic::new(
                DiagnosticKind::AmbiguousFilter,
                accessor,
                format!(
                    "{} records matched, returning first match {}",
                    rest.len() + 1,
                    display_opt(picked)
                ),
            ));
            FilterOutcome::Selected(picked)
        }
    }
}

/// `record[key]` must be a string equal to `value`, or missing for a bare key.
/// No coercion: `5` never equals `"5"`.
fn satisfies(record: &Value, condition: &Condition) -> bool {
    match (&condition.value, record.get(&condition.key)) {
        (Some(value), Some(Value::String(s))) => s == value,
        (Some(_), _) => false,
        (None, found) => found.is_none(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display_opt(v: Option<&Value>) -> String {
    v.map_or_else(|| "undefined".to_string(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCollector;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cond(key: &str, value: &str) -> Condition {
        Condition {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    fn bare(key: &str) -> Condition {
        Condition {
            key: key.into(),
            value: None,
        }
    }

    fn links() -> Value {
        json!([
            { "href": "http://www.site.com/mystyle.css", "rel": "stylesheet" },
            { "href": "http://www.site.com/foo.html", "rel": "self", "lang": "en" },
            { "href": "http://www.site.com/bar.html", "rel": "self", "lang": "no" }
        ])
    }

    #[test]
    fn unique_match_extracts_field() {
        let sink = DiagnosticCollector::new();
        let records = links();
        let out = filter_one(&records, "href", &[cond("rel", "stylesheet")], "links", &sink);
        assert_eq!(out.value(), Some(&json!("http://www.site.com/mystyle.css")));
        assert!(sink.is_empty());
    }

    #[test]
    fn all_conditions_must_hold() {
        let sink = DiagnosticCollector::new();
        let records = links();
        let out = filter_one(
            &records,
            "href",
            &[cond("rel", "self"), cond("lang", "no")],
            "links",
            &sink,
        );
        assert_eq!(out.value(), Some(&json!("http://www.site.com/bar.html")));
    }

    #[test]
    fn ambiguous_takes_first_and_warns() {
        let sink = DiagnosticCollector::new();
        let records = links();
        let out = filter_one(&records, "href", &[cond("rel", "self")], "links", &sink);
        assert_eq!(out, FilterOutcome::Selected(Some(&json!("http://www.site.com/foo.html"))));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::AmbiguousFilter]);
        assert!(!sink.has_errors());
    }

    #[test]
    fn no_match_returns_records() {
        let sink = DiagnosticCollector::new();
        let records = links();
        let out = filter_one(&records, "href", &[cond("rel", "parent")], "links", &sink);
        assert_eq!(out, FilterOutcome::Unchanged(&records));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::NoFilterMatch]);
    }

    #[test]
    fn no_type_coercion() {
        let sink = DiagnosticCollector::new();
        let records = json!([{ "id": 5, "name": "five" }]);
        let out = filter_one(&records, "name", &[cond("id", "5")], "items", &sink);
        assert_eq!(out, FilterOutcome::Unchanged(&records));
    }

    #[test]
    fn bare_key_requires_missing_field() {
        let sink = DiagnosticCollector::new();
        let records = links();
        let out = filter_one(&records, "href", &[bare("lang")], "links", &sink);
        assert_eq!(out.value(), Some(&json!("http://www.site.com/mystyle.css")));
        assert!(sink.is_empty());

        let records = json!([{ "href": "a", "rel": null }]);
        let out = filter_one(&records, "href", &[bare("rel")], "links", &sink);
        assert_eq!(out, FilterOutcome::Unchanged(&records));
    }

    #[test]
    fn empty_value_is_not_a_bare_key() {
        let sink = DiagnosticCollector::new();
        let records = json!([{ "href": "a" }, { "href": "b", "rel": "" }]);
        let out = filter_one(&records, "href", &[cond("rel", "")], "links", &sink);
        assert_eq!(out.value(), Some(&json!("b")));
    }

    #[test]
    fn best_guess_skips_falsy() {
        let sink = DiagnosticCollector::new();
        let records = json!([{ "name": "" }, { "other": 1 }, { "name": "Tea" }, { "name": "Coffee" }]);
        let out = filter_one(&records, "name", &[], "items", &sink);
        assert_eq!(out.value(), Some(&json!("Tea")));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::BestGuess]);
    }

    #[test]
    fn best_guess_without_candidates_returns_records() {
        let sink = DiagnosticCollector::new();
        let records = json!([{ "name": null }, {}]);
        let out = filter_one(&records, "name", &[], "items", &sink);
        assert_eq!(out, FilterOutcome::Unchanged(&records));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::NoFilterMatch]);
    }

    #[test]
    fn selected_record_without_field() {
        let sink = DiagnosticCollector::new();
        let records = json!([{ "rel": "self" }]);
        let out = filter_one(&records, "href", &[cond("rel", "self")], "links", &sink);
        assert_eq!(out, FilterOutcome::Selected(None));
        assert_eq!(out.value(), None);
    }

    #[test]
    fn non_array_is_returned_unchanged() {
        let sink = DiagnosticCollector::new();
        let records = json!({ "href": "x" });
        let out = filter_one(&records, "href", &[cond("rel", "self")], "links", &sink);
        assert_eq!(out, FilterOutcome::Unchanged(&records));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::MalformedArrayInput]);
    }
}
