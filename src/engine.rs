use serde_json::Value;

use crate::context::{Options, Substitution};
use crate::decoder::decode;
use crate::diagnostics::DiagnosticSink;
use crate::errors::Result;
use crate::functions::Registry;
use crate::resolver::{resolve_path, Resolution};

// =========================
// Template rendering
// =========================

/// Substitute every accessor token of `template` with its resolved value.
///
/// Tokens are resolved once each, in first-appearance order. An unknown function
/// aborts the render; every other failure degrades to a fallback value.
pub fn render(
    root: &Value,
    template: &str,
    registry: &Registry,
    sink: &dyn DiagnosticSink,
    opts: &Options,
) -> Result<String> {
    let decoder = decode(template);
    if decoder.is_empty() {
        return Ok(template.to_string());
    }
    tracing::debug!(tokens = decoder.len(), "applying template");

    let texts = decoder
        .iter()
        .map(|(token, path)| -> Result<String> {
            let resolution = resolve_path(root, path, token, registry, sink)?;
            Ok(stringify(&resolution, &opts.undefined_text))
        })
        .collect::<Result<Vec<String>>>()?;

    let out = match opts.substitution {
        Substitution::SinglePass => {
            let mut out = String::with_capacity(template.len());
            let mut last = 0;
            for (span, idx) in decoder.occurrences() {
                out.push_str(&template[last..span.start]);
                out.push_str(&texts[*idx]);
                last = span.end;
            }
            out.push_str(&template[last..]);
            out
        }
        Substitution::ReplaceAll => decoder
            .keys()
            .zip(&texts)
            .fold(template.to_string(), |acc, (token, text)| acc.replace(token, text)),
    };
    tracing::trace!(html = %out, "template applied");
    Ok(out)
}

/// Text form of a resolved value: strings verbatim, numbers and booleans in their
/// natural form, arrays and objects as compact JSON, null and undefined as
/// `undefined_text`.
pub fn stringify(resolution: &Resolution, undefined_text: &str) -> String {
    match resolution.value() {
        None | Some(Value::Null) => undefined_text.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse JSON text into a value for rendering.
pub fn from_json(json_str: &str) -> Result<Value> {
    Ok(serde_json::from_str(json_str)?)
}
