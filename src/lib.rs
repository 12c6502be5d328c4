//! Accessor definitions and HTML templates over JSON service results.
//!
//! An accessor definition is a small path language wrapped in `%(...)`:
//!
//! - `%(type.id)`: nested field access
//! - `%(links:href[rel=stylesheet&lang=en])`: pick the one record of the `links`
//!   array whose fields match, then take its `href`
//! - `%(__function:name[params])`: call a function registered by the application
//!
//! [`Engine::render`] substitutes every definition found in a template;
//! [`Engine::resolve`] extracts a single value.

pub mod errors;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod functions;  // plugin model
pub mod decoder;
pub mod path;
pub mod resolver;
pub mod filter;
mod parser;

use std::sync::Arc;

use serde_json::Value;
use errors::Result;
use context::Options;
use diagnostics::{DiagnosticSink, TracingSink};
use functions::Registry;
use resolver::Resolution;

/// Renders templates and resolves accessors against JSON values.
///
/// Holds the function registry, the diagnostic sink and rendering options; all
/// three are supplied by the embedding application.
#[derive(Clone)]
pub struct Engine {
    registry: Registry,
    sink: Arc<dyn DiagnosticSink>,
    opts: Options,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            sink: Arc::new(TracingSink),
            opts: Options::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_options(mut self, opts: Options) -> Self {
        self.opts = opts;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Render `template` against `root`, e.g. `"<a>%(id)</a>"` -> `"<a>7</a>"`.
    pub fn render(&self, root: &Value, template: &str) -> Result<String> {
        engine::render(root, template, &self.registry, self.sink.as_ref(), &self.opts)
    }

    /// Resolve a single accessor definition such as `%(type.id)`.
    ///
    /// Fallbacks come back as their stand-in value and undefined as null; use
    /// [`Engine::resolve_detailed`] to tell them apart.
    pub fn resolve(&self, root: &Value, definition: &str) -> Result<Value> {
        Ok(self.resolve_detailed(root, definition)?.into_value())
    }

    pub fn resolve_detailed(&self, root: &Value, definition: &str) -> Result<Resolution> {
        resolver::resolve_definition(root, definition, &self.registry, self.sink.as_ref())
    }

    /// Drill into the results part of a service response, e.g. `%(hits)`.
    pub fn select_results<'a>(&self, data: &'a Value, identifier: Option<&str>) -> &'a Value {
        resolver::select_results(data, identifier, self.sink.as_ref())
    }

    /// Render one string per result: drill into `results`, then apply `template`
    /// to every item of the list (or to the single value if it is not a list).
    pub fn render_each(&self, data: &Value, results: Option<&str>, template: &str) -> Result<Vec<String>> {
        match self.select_results(data, results) {
            Value::Array(items) => items.iter().map(|item| self.render(item, template)).collect(),
            other => Ok(vec![self.render(other, template)?]),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

/// Convenience: render with an empty registry, logging diagnostics via `tracing`.
pub fn render(root: &Value, template: &str) -> Result<String> {
    Engine::default().render(root, template)
}

/// Convenience: resolve with an empty registry, logging diagnostics via `tracing`.
pub fn resolve(root: &Value, definition: &str) -> Result<Value> {
    Engine::default().resolve(root, definition)
}

/// Re-export the most-used pieces for users who work below the `Engine`.
pub use decoder::{decode, Decoder};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity};
pub use engine::{from_json, stringify};
pub use errors::AccessorError;
pub use functions::markup::{escape_tags, escape_xml, unescape_xml};
pub use functions::Function;
pub use path::{Condition, Path, Step};
pub use resolver::FallbackReason;
