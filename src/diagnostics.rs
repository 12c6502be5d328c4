use std::fmt;
use std::sync::{Arc, Mutex};

/// What went soft-wrong while resolving an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A plain field step landed on an array.
    MissingFilter,
    /// More than one record satisfied the conditions; the first one was used.
    AmbiguousFilter,
    /// No record satisfied the conditions; the array was returned as is.
    NoFilterMatch,
    /// No conditions given; the first record carrying the field was used.
    BestGuess,
    /// A filtered step was applied to something that is not an array.
    MalformedArrayInput,
    /// A single-accessor lookup got a definition holding several tokens.
    MultipleAccessors,
    /// Traversal stepped into null; the root was returned.
    TraversalFailed,
    /// The service results identifier did not lead anywhere.
    ResultsNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::AmbiguousFilter
            | DiagnosticKind::BestGuess
            | DiagnosticKind::MultipleAccessors => Severity::Warning,
            DiagnosticKind::MissingFilter
            | DiagnosticKind::NoFilterMatch
            | DiagnosticKind::MalformedArrayInput
            | DiagnosticKind::TraversalFailed
            | DiagnosticKind::ResultsNotFound => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Accessor text (token or step) the diagnostic is about.
    pub accessor: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, accessor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            accessor: accessor.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in `{}`: {}", self.kind, self.accessor, self.message)
    }
}

/// Where soft failures go. Injected by whoever embeds the engine.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, d: Diagnostic) {
        match d.severity {
            Severity::Warning => {
                tracing::warn!(kind = ?d.kind, accessor = %d.accessor, "{}", d.message)
            }
            Severity::Error => {
                tracing::error!(kind = ?d.kind, accessor = %d.accessor, "{}", d.message)
            }
        }
    }
}

/// Keeps diagnostics in memory. Clones share the same buffer, so one handle can
/// go into the engine while the caller keeps the other.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    inner: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.lock().iter().map(|d| d.kind).collect()
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // a panic while holding the lock leaves the Vec intact
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "collected");
        self.lock().push(diagnostic);
    }
}
