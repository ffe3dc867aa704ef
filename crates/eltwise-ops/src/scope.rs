//! Optional instrumentation context for node entry points.
//!
//! Entry points take a `&dyn OpScope` and hold the returned guard for the
//! duration of the call. [`NoopScope`] is the default; [`TracingScope`]
//! opens a `tracing` span per call.

use tracing::Level;
use tracing::span::EnteredSpan;

/// Guard returned by [`OpScope::enter`]; the scope closes on drop.
#[must_use = "the scope closes when the guard is dropped"]
#[derive(Debug, Default)]
pub struct ScopeGuard(Option<EnteredSpan>);

impl ScopeGuard {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_span(span: EnteredSpan) -> Self {
        Self(Some(span))
    }
}

/// Instrumentation hook invoked at each public node entry point.
pub trait OpScope: Send + Sync {
    /// Enter the named scope, e.g. `("Multiply", "evaluate")`.
    fn enter(&self, op: &'static str, entry: &'static str) -> ScopeGuard;
}

/// Scope that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScope;

impl OpScope for NoopScope {
    #[inline]
    fn enter(&self, _op: &'static str, _entry: &'static str) -> ScopeGuard {
        ScopeGuard::none()
    }
}

/// Scope backed by a `tracing` span at the configured level.
#[derive(Clone, Copy, Debug)]
pub struct TracingScope {
    level: Level,
}

impl TracingScope {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingScope {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl OpScope for TracingScope {
    fn enter(&self, op: &'static str, entry: &'static str) -> ScopeGuard {
        let span = if self.level == Level::ERROR {
            tracing::error_span!("op", op, entry)
        } else if self.level == Level::WARN {
            tracing::warn_span!("op", op, entry)
        } else if self.level == Level::INFO {
            tracing::info_span!("op", op, entry)
        } else if self.level == Level::DEBUG {
            tracing::debug_span!("op", op, entry)
        } else {
            tracing::trace_span!("op", op, entry)
        };
        ScopeGuard::from_span(span.entered())
    }
}
