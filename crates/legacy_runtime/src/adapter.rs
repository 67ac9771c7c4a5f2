use std::sync::Arc;

use host::{CallOutcome, GlobalScope};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const DEFAULT_LOG_PREFIX: &str = "[kiwi-actions]";

/// Sink for adapter diagnostics. Swapped out in tests to observe warnings.
pub trait RuntimeLogger: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str, error: &anyhow::Error);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RuntimeLogger for TracingLogger {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str, error: &anyhow::Error) {
        error!(error = %error, "{message}");
    }
}

#[derive(Clone, Default)]
pub struct AdapterOptions {
    pub logger: Option<Arc<dyn RuntimeLogger>>,
    pub log_prefix: Option<String>,
}

impl AdapterOptions {
    pub fn with_logger(mut self, logger: Arc<dyn RuntimeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_prefix = Some(prefix.into());
        self
    }
}

/// Where an invocation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Namespace,
    Global,
    Missing,
}

#[derive(Clone)]
pub struct LegacyRuntimeAdapter {
    scope: GlobalScope,
    namespace: Option<String>,
    label: String,
    logger: Arc<dyn RuntimeLogger>,
    log_prefix: String,
}

impl LegacyRuntimeAdapter {
    /// Adapter over a named runtime namespace with loose-function fallback.
    pub fn namespaced(
        scope: GlobalScope,
        namespace: impl Into<String>,
        label: impl Into<String>,
        options: AdapterOptions,
    ) -> Self {
        Self::build(scope, Some(namespace.into()), label.into(), options)
    }

    /// Adapter over loose functions on the global scope only.
    pub fn globals_only(scope: GlobalScope, options: AdapterOptions) -> Self {
        Self::build(scope, None, "legacy".to_string(), options)
    }

    fn build(
        scope: GlobalScope,
        namespace: Option<String>,
        label: String,
        options: AdapterOptions,
    ) -> Self {
        Self {
            scope,
            namespace,
            label,
            logger: options.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            log_prefix: options
                .log_prefix
                .unwrap_or_else(|| DEFAULT_LOG_PREFIX.to_string()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn scope(&self) -> &GlobalScope {
        &self.scope
    }

    /// Reports where `method` would resolve right now without calling it.
    pub fn resolve(&self, method: &str) -> Resolution {
        if method.is_empty() {
            return Resolution::Missing;
        }
        let in_namespace = self
            .namespace
            .as_deref()
            .and_then(|name| self.scope.namespace(name))
            .is_some_and(|table| table.has(method));
        if in_namespace {
            Resolution::Namespace
        } else if self.scope.functions().get(method).is_some() {
            Resolution::Global
        } else {
            Resolution::Missing
        }
    }

    fn call(&self, method: &str, args: &[Value]) -> Option<(Resolution, CallOutcome)> {
        if method.is_empty() {
            return None;
        }
        if let Some(table) = self
            .namespace
            .as_deref()
            .and_then(|name| self.scope.namespace(name))
        {
            if let Some(outcome) = table.call(method, args) {
                return Some((Resolution::Namespace, outcome));
            }
        }
        self.scope
            .functions()
            .get(method)
            .map(|function| (Resolution::Global, function(args)))
    }

    /// Fire-and-forget call. Pending legacy work is still driven; its failure
    /// is only traced.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Resolution {
        match self.call(method, &args) {
            Some((resolution, outcome)) => {
                debug!(method, ?resolution, "runtime: invoked");
                if let CallOutcome::Pending(work) = outcome {
                    let name = method.to_string();
                    self.spawn(method, async move {
                        if let Err(error) = work.await {
                            error!(method = %name, error = %error, "runtime: unobserved legacy failure");
                        }
                    });
                }
                resolution
            }
            None => {
                self.warn_missing(method);
                Resolution::Missing
            }
        }
    }

    /// Call whose pending work is driven on the current runtime, with failures
    /// routed to the logger. The handle completes once that work has settled.
    pub fn invoke_async(&self, method: &str, args: Vec<Value>) -> Option<JoinHandle<()>> {
        let Some((resolution, outcome)) = self.call(method, &args) else {
            self.warn_missing(method);
            return None;
        };
        debug!(method, ?resolution, "runtime: invoked async");
        let CallOutcome::Pending(work) = outcome else {
            return None;
        };

        let logger = self.logger.clone();
        let message = format!(
            "{} {} handler \"{}\" failed.",
            self.log_prefix,
            capitalized(&self.label),
            method
        );
        self.spawn(method, async move {
            if let Err(error) = work.await {
                logger.error(&message, &error);
            }
        })
    }

    fn spawn<F>(&self, method: &str, work: F) -> Option<JoinHandle<()>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(work)),
            Err(_) => {
                self.logger.warn(&format!(
                    "{} No async runtime to drive {} handler \"{}\"",
                    self.log_prefix, self.label, method
                ));
                None
            }
        }
    }

    fn warn_missing(&self, method: &str) {
        self.logger.warn(&format!(
            "{} Missing {} handler \"{}\"",
            self.log_prefix, self.label, method
        ));
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
