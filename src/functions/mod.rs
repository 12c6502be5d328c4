use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use crate::errors::{AccessorError, Result};

pub mod markup;

/// A named extraction point reachable from templates as `%(__function:name[params])`.
///
/// `params` is the raw text between the brackets, or `None` when there are none.
/// Calls are synchronous; anything needing async data must return a placeholder
/// and update its target through its own channel.
pub trait Function: Send + Sync {
    fn name(&self) -> &str;
    fn call(&self, root: &Value, params: Option<&str>) -> Result<Value>;
}

/// Adapter so plain closures can be registered.
struct FnFunction<F> {
    name: String,
    f: F,
}

impl<F> Function for FnFunction<F>
where
    F: Fn(&Value, Option<&str>) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str { &self.name }
    fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
        (self.f)(root, params)
    }
}

/// Thread-safe function registry, filled by the embedding application.
///
/// `Registry::new()` is empty; builtins are only present via [`Registry::with_builtins`].
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<String, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(builtins::Json);
        reg.register(builtins::Lower);
        reg.register(builtins::Upper);
        reg.register(builtins::EscapeXml);
        reg.register(builtins::EscapeTags);
        reg
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let mut_map = Arc::make_mut(&mut self.inner);
        mut_map.insert(f.name().to_string(), Arc::new(f));
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value, Option<&str>) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(FnFunction { name: name.into(), f });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look `name` up and call it. An unregistered name is a hard error.
    pub fn invoke(&self, name: &str, root: &Value, params: Option<&str>) -> Result<Value> {
        let f = self.get(name).ok_or_else(|| AccessorError::UnknownFunction {
            name: name.to_string(),
        })?;
        tracing::debug!(function = name, params, "invoking registered function");
        f.call(root, params)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("functions", &self.names()).finish()
    }
}

pub mod builtins {
    use super::*;

    static NULL: Value = Value::Null;

    /// The params string names a top-level field of the root; no params means the root.
    fn subject<'a>(root: &'a Value, params: Option<&str>) -> &'a Value {
        match params.filter(|p| !p.is_empty()) {
            Some(field) => root.get(field).unwrap_or(&NULL),
            None => root,
        }
    }

    fn map_str(v: &Value, f: impl Fn(&str) -> String) -> Value {
        match v {
            Value::String(t) => Value::String(f(t)),
            other => other.clone(),
        }
    }

    /// `%(__function:json)` / `%(__function:json[field])`: JSON text of the subject.
    pub struct Json;
    impl Function for Json {
        fn name(&self) -> &str { "json" }
        fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
            Ok(Value::String(serde_json::to_string(subject(root, params))?))
        }
    }

    pub struct Lower;
    impl Function for Lower {
        fn name(&self) -> &str { "lower" }
        fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
            Ok(map_str(subject(root, params), str::to_lowercase))
        }
    }

    pub struct Upper;
    impl Function for Upper {
        fn name(&self) -> &str { "upper" }
        fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
            Ok(map_str(subject(root, params), str::to_uppercase))
        }
    }

    pub struct EscapeXml;
    impl Function for EscapeXml {
        fn name(&self) -> &str { "escape_xml" }
        fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
            Ok(map_str(subject(root, params), markup::escape_xml))
        }
    }

    pub struct EscapeTags;
    impl Function for EscapeTags {
        fn name(&self) -> &str { "escape_tags" }
        fn call(&self, root: &Value, params: Option<&str>) -> Result<Value> {
            Ok(map_str(subject(root, params), markup::escape_tags))
        }
    }
}
