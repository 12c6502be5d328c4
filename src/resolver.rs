use serde_json::Value;

use crate::decoder::decode;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::filter::{filter_one, FilterOutcome};
use crate::functions::Registry;
use crate::path::{Path, Step};

/// Outcome of walking one accessor against a value.
///
/// Hard failures (unknown functions) are the `Err` side of [`resolve_path`];
/// everything else lands in one of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every step resolved.
    Resolved(Value),
    /// The path walked off the graph (a missing field, or a field of a scalar).
    Undefined,
    /// Resolution gave up; `value` is the best-effort stand-in.
    Fallback { value: Value, reason: FallbackReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Plain field step on an array; `value` is the array.
    MissingFilter,
    /// No record satisfied the filter; `value` is the array.
    NoFilterMatch,
    /// A filtered step found a non-array; `value` is what it found.
    NotAnArray,
    /// Traversal stepped into null; `value` is the root.
    TraversalFailed,
    /// The definition held no accessor token; `value` is the root.
    NoAccessor,
}

impl Resolution {
    /// `None` only for [`Resolution::Undefined`].
    pub fn value(&self) -> Option<&Value> {
        match self {
            Resolution::Resolved(v) | Resolution::Fallback { value: v, .. } => Some(v),
            Resolution::Undefined => None,
        }
    }

    /// Collapse to a plain value; undefined becomes null.
    pub fn into_value(self) -> Value {
        match self {
            Resolution::Resolved(v) | Resolution::Fallback { value: v, .. } => v,
            Resolution::Undefined => Value::Null,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    fn fallback(value: &Value, reason: FallbackReason) -> Self {
        Resolution::Fallback {
            value: value.clone(),
            reason,
        }
    }
}

/// Walk `path` from `root`.
///
/// A function step anywhere in the path replaces the walk: the first one is
/// invoked with `root` before any field is read, so steps in front of it can
/// neither change its result nor hide an unregistered name. `accessor` labels
/// diagnostics.
pub fn resolve_path(
    root: &Value,
    path: &Path,
    accessor: &str,
    registry: &Registry,
    sink: &dyn DiagnosticSink,
) -> Result<Resolution> {
    if let Some((name, params)) = path.steps.iter().find_map(|step| match step {
        Step::Function { name, params } => Some((name, params)),
        _ => None,
    }) {
        return registry
            .invoke(name, root, params.as_deref())
            .map(Resolution::Resolved);
    }

    let mut cursor = root;
    for step in &path.steps {
        match step {
            Step::Function { .. } => unreachable!("function steps are invoked before the walk"),
            _ if cursor.is_null() => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::TraversalFailed,
                    accessor,
                    format!("cannot read `{step}` of null, returning the root"),
                ));
                return Ok(Resolution::fallback(root, FallbackReason::TraversalFailed));
            }
            Step::Field { name } => {
                if cursor.is_array() {
                    return Ok(missing_filter(cursor, accessor, step, sink));
                }
                match cursor.get(name.as_str()) {
                    None => return Ok(Resolution::Undefined),
                    Some(next) if next.is_array() => {
                        return Ok(missing_filter(next, accessor, step, sink));
                    }
                    Some(next) => cursor = next,
                }
            }
            Step::Filtered {
                name,
                extract,
                conditions,
            } => {
                let Some(target) = cursor.get(name.as_str()) else {
                    return Ok(Resolution::Undefined);
                };
                let label = format!("{accessor} ({step})");
                match filter_one(target, extract, conditions, &label, sink) {
                    FilterOutcome::Selected(Some(next)) => cursor = next,
                    FilterOutcome::Selected(None) => return Ok(Resolution::Undefined),
                    FilterOutcome::Unchanged(v) => {
                        let reason = if v.is_array() {
                            FallbackReason::NoFilterMatch
                        } else {
                            FallbackReason::NotAnArray
                        };
                        return Ok(Resolution::fallback(v, reason));
                    }
                }
            }
        }
    }
    Ok(Resolution::Resolved(cursor.clone()))
}

fn missing_filter(array: &Value, accessor: &str, step: &Step, sink: &dyn DiagnosticSink) -> Resolution {
    sink.report(Diagnostic::new(
        DiagnosticKind::MissingFilter,
        accessor,
        format!("`{step}` addresses an array; a conditional filter like `{step}:field[key=value]` is required"),
    ));
    Resolution::fallback(array, FallbackReason::MissingFilter)
}

/// Resolve a definition expected to hold exactly one accessor token, e.g. `%(type.id)`.
///
/// Extra tokens are ignored with a warning; no token at all yields the root.
pub fn resolve_definition(
    root: &Value,
    definition: &str,
    registry: &Registry,
    sink: &dyn DiagnosticSink,
) -> Result<Resolution> {
    let decoder = decode(definition);
    if decoder.len() > 1 {
        sink.report(Diagnostic::new(
            DiagnosticKind::MultipleAccessors,
            definition,
            format!(
                "expected a single accessor definition but found {}, using the first",
                decoder.len()
            ),
        ));
    }
    match decoder.first() {
        Some((token, path)) => resolve_path(root, path, token, registry, sink),
        None => {
            tracing::debug!(definition, "no accessor definition found, returning root");
            Ok(Resolution::fallback(root, FallbackReason::NoAccessor))
        }
    }
}

/// Step down into the part of a service response that holds the result list.
///
/// `identifier` is one accessor of plain fields such as `%(hits)` or
/// `%(feed.entries)`. A blank identifier means the response itself is the list.
/// Anything that does not lead to a value returns `data` unchanged.
pub fn select_results<'a>(
    data: &'a Value,
    identifier: Option<&str>,
    sink: &dyn DiagnosticSink,
) -> &'a Value {
    let Some(identifier) = identifier.map(str::trim).filter(|s| !s.is_empty()) else {
        return data;
    };
    let decoder = decode(identifier);
    let Some(path) = decoder.get(identifier) else {
        sink.report(Diagnostic::new(
            DiagnosticKind::ResultsNotFound,
            identifier,
            "results identifier is not a single accessor definition",
        ));
        return data;
    };

    let mut cursor = data;
    for step in &path.steps {
        let next = match step {
            Step::Field { name } => cursor.get(name.as_str()),
            _ => None,
        };
        match next {
            Some(next) => {
                tracing::trace!(step = %step, "stepping down into results");
                cursor = next;
            }
            None => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::ResultsNotFound,
                    identifier,
                    format!("unable to step down into `{step}`, keeping the whole response"),
                ));
                return data;
            }
        }
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCollector;
    use crate::errors::AccessorError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolve(root: &Value, definition: &str) -> (Resolution, DiagnosticCollector) {
        let sink = DiagnosticCollector::new();
        let out = resolve_definition(root, definition, &Registry::new(), &sink).unwrap();
        (out, sink)
    }

    fn item() -> Value {
        json!({
            "item": {
                "id": "89efew89f",
                "names": [
                    { "name": "United Nations", "lang": "en" },
                    { "name": "Forente Nasjoner", "lang": "no" }
                ],
                "type": null,
                "count": 3
            }
        })
    }

    #[test]
    fn nested_fields() {
        let (out, sink) = resolve(&item(), "%(item.id)");
        assert_eq!(out, Resolution::Resolved(json!("89efew89f")));
        assert!(sink.is_empty());
    }

    #[test]
    fn filtered_inside_nested_object() {
        let (out, _) = resolve(&item(), "%(item.names:name[lang=no])");
        assert_eq!(out, Resolution::Resolved(json!("Forente Nasjoner")));
    }

    #[test]
    fn missing_field_is_undefined() {
        let (out, sink) = resolve(&item(), "%(item.image.uri)");
        assert_eq!(out, Resolution::Undefined);
        assert!(sink.is_empty());
        let (out, _) = resolve(&item(), "%(item.count.value)");
        assert_eq!(out, Resolution::Undefined);
    }

    #[test]
    fn stepping_into_null_falls_back_to_root() {
        let root = item();
        let (out, sink) = resolve(&root, "%(item.type.id)");
        assert_eq!(
            out,
            Resolution::Fallback {
                value: root,
                reason: FallbackReason::TraversalFailed
            }
        );
        assert_eq!(sink.kinds(), vec![DiagnosticKind::TraversalFailed]);
    }

    #[test]
    fn array_without_filter() {
        let (out, sink) = resolve(&item(), "%(item.names.name)");
        assert_eq!(
            out,
            Resolution::Fallback {
                value: item()["item"]["names"].clone(),
                reason: FallbackReason::MissingFilter
            }
        );
        assert_eq!(sink.kinds(), vec![DiagnosticKind::MissingFilter]);
    }

    #[test]
    fn root_array_without_filter() {
        let root = json!([{ "id": 1 }]);
        let (out, _) = resolve(&root, "%(id)");
        assert_eq!(out.value(), Some(&root));
        assert!(!out.is_resolved());
    }

    #[test]
    fn filter_on_object_is_malformed() {
        let (out, sink) = resolve(&item(), "%(item:id[a=b])");
        assert!(matches!(out, Resolution::Fallback { reason: FallbackReason::NotAnArray, .. }));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::MalformedArrayInput]);
    }

    #[test]
    fn filter_match_without_extracted_field() {
        let (out, _) = resolve(&item(), "%(item.names:title[lang=en])");
        assert_eq!(out, Resolution::Undefined);
        assert_eq!(out.into_value(), Value::Null);
    }

    #[test]
    fn no_token_returns_root() {
        let root = item();
        let (out, sink) = resolve(&root, "item.id");
        assert_eq!(out.value(), Some(&root));
        assert!(sink.is_empty());
    }

    #[test]
    fn multiple_tokens_use_first() {
        let (out, sink) = resolve(&item(), "%(item.id) %(item.count)");
        assert_eq!(out, Resolution::Resolved(json!("89efew89f")));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::MultipleAccessors]);
    }

    #[test]
    fn function_step_ends_walk_with_root() {
        let mut reg = Registry::new();
        reg.register_fn("count_keys", |root, _| {
            Ok(json!(root.as_object().map_or(0, |m| m.len())))
        });
        let sink = DiagnosticCollector::new();
        let out = resolve_definition(&item(), "%(item.__function:count_keys.ignored)", &reg, &sink).unwrap();
        assert_eq!(out, Resolution::Resolved(json!(1)));
    }

    #[test]
    fn unknown_function_is_hard_error() {
        let sink = DiagnosticCollector::new();
        let err = resolve_definition(&item(), "%(__function:nope)", &Registry::new(), &sink).unwrap_err();
        assert!(matches!(err, AccessorError::UnknownFunction { ref name } if name == "nope"));
    }

    #[test]
    fn unknown_function_behind_missing_field() {
        let sink = DiagnosticCollector::new();
        for definition in [
            "%(missing.__function:doesNotExist)",
            "%(item.type.id.__function:doesNotExist)",
            "%(item.names.name.__function:doesNotExist)",
        ] {
            let err = resolve_definition(&item(), definition, &Registry::new(), &sink).unwrap_err();
            assert!(matches!(err, AccessorError::UnknownFunction { ref name } if name == "doesNotExist"));
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn function_after_missing_field_still_runs() {
        let mut reg = Registry::new();
        reg.register_fn("awesome", |_, _| Ok(json!("Awesome!")));
        let sink = DiagnosticCollector::new();
        let out = resolve_definition(&item(), "%(missing.deeper.__function:awesome)", &reg, &sink).unwrap();
        assert_eq!(out, Resolution::Resolved(json!("Awesome!")));
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_brackets_are_best_guess() {
        let (out, sink) = resolve(&item(), "%(item.names:name[])");
        assert_eq!(out, Resolution::Resolved(json!("United Nations")));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::BestGuess]);
    }

    #[test]
    fn bare_key_matches_records_without_it() {
        let root = json!({ "links": [{ "href": "x", "rel": "a" }, { "href": "y" }] });
        let (out, sink) = resolve(&root, "%(links:href[rel])");
        assert_eq!(out, Resolution::Resolved(json!("y")));
        assert!(sink.is_empty());
    }

    #[test]
    fn results_drilling() {
        let sink = DiagnosticCollector::new();
        let data = json!({ "num_hits": 2, "feed": { "entries": [{ "fname": "jack" }, { "fname": "jane" }] } });
        assert_eq!(select_results(&data, Some("%(feed.entries)"), &sink), &data["feed"]["entries"]);
        assert_eq!(select_results(&data, None, &sink), &data);
        assert_eq!(select_results(&data, Some("  "), &sink), &data);
        assert!(sink.is_empty());

        assert_eq!(select_results(&data, Some("%(feed.hits)"), &sink), &data);
        assert_eq!(select_results(&data, Some("feed.entries"), &sink), &data);
        assert_eq!(sink.kinds(), vec![DiagnosticKind::ResultsNotFound, DiagnosticKind::ResultsNotFound]);
    }
}
