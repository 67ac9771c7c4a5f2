use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::dom::Document;

/// Result of calling into legacy code. Async legacy functions hand back their
/// pending work; callers decide whether to drive it.
pub enum CallOutcome {
    Completed,
    Pending(BoxFuture<'static, anyhow::Result<()>>),
}

impl CallOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("Completed"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

pub type LegacyFunction = Arc<dyn Fn(&[Value]) -> CallOutcome + Send + Sync>;

/// Type-erased dependency provider published by the legacy bundle.
pub type DependencyProvider = Arc<dyn Any + Send + Sync>;

pub trait CapabilityTable: Send + Sync {
    fn has(&self, name: &str) -> bool;

    /// Calls `name` when present; `None` means the capability is absent.
    fn call(&self, name: &str, args: &[Value]) -> Option<CallOutcome>;
}

#[derive(Default)]
pub struct FunctionTable {
    entries: RwLock<HashMap<String, LegacyFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> CallOutcome + Send + Sync + 'static,
    {
        self.define(name, function);
        self
    }

    pub fn define<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> CallOutcome + Send + Sync + 'static,
    {
        self.entries.write().insert(name.into(), Arc::new(function));
    }

    pub fn remove(&self, name: &str) -> bool {
        self.entries.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<LegacyFunction> {
        self.entries.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl CapabilityTable for FunctionTable {
    fn has(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<CallOutcome> {
        // Clone out of the lock: legacy functions may redefine entries.
        let function = self.get(name)?;
        Some(function(args))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEvent {
    LegacyReady,
}

struct ScopeInner {
    namespaces: HashMap<String, Arc<dyn CapabilityTable>>,
    providers: HashMap<String, DependencyProvider>,
    document: Option<Document>,
}

#[derive(Clone)]
pub struct GlobalScope {
    inner: Arc<RwLock<ScopeInner>>,
    functions: Arc<FunctionTable>,
    events: broadcast::Sender<ScopeEvent>,
}

/// Non-owning handle for code the scope itself ends up holding, such as slice
/// APIs published back into it.
#[derive(Clone)]
pub struct WeakScope {
    inner: Weak<RwLock<ScopeInner>>,
    functions: Weak<FunctionTable>,
    events: broadcast::Sender<ScopeEvent>,
}

impl WeakScope {
    pub fn upgrade(&self) -> Option<GlobalScope> {
        Some(GlobalScope {
            inner: self.inner.upgrade()?,
            functions: self.functions.upgrade()?,
            events: self.events.clone(),
        })
    }
}

impl Default for GlobalScope {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalScope {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(RwLock::new(ScopeInner {
                namespaces: HashMap::new(),
                providers: HashMap::new(),
                document: None,
            })),
            functions: Arc::new(FunctionTable::new()),
            events,
        }
    }

    pub fn downgrade(&self) -> WeakScope {
        WeakScope {
            inner: Arc::downgrade(&self.inner),
            functions: Arc::downgrade(&self.functions),
            events: self.events.clone(),
        }
    }

    pub fn with_document(document: Document) -> Self {
        let scope = Self::new();
        scope.set_document(Some(document));
        scope
    }

    pub fn document(&self) -> Option<Document> {
        self.inner.read().document.clone()
    }

    pub fn set_document(&self, document: Option<Document>) {
        self.inner.write().document = document;
    }

    /// Installs or replaces a whole runtime namespace.
    pub fn set_namespace(&self, name: impl Into<String>, table: Arc<dyn CapabilityTable>) {
        self.inner.write().namespaces.insert(name.into(), table);
    }

    pub fn remove_namespace(&self, name: &str) -> bool {
        self.inner.write().namespaces.remove(name).is_some()
    }

    pub fn namespace(&self, name: &str) -> Option<Arc<dyn CapabilityTable>> {
        self.inner.read().namespaces.get(name).cloned()
    }

    /// Loose functions defined directly on the scope.
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn define_function<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> CallOutcome + Send + Sync + 'static,
    {
        self.functions.define(name, function);
    }

    pub fn remove_function(&self, name: &str) -> bool {
        self.functions.remove(name)
    }

    pub fn set_dependency_provider<T>(&self, key: impl Into<String>, provider: T)
    where
        T: Any + Send + Sync,
    {
        self.inner
            .write()
            .providers
            .insert(key.into(), Arc::new(provider));
    }

    pub fn remove_dependency_provider(&self, key: &str) -> bool {
        self.inner.write().providers.remove(key).is_some()
    }

    /// Looks up a provider under `key`. A provider of another type reads as
    /// absent.
    pub fn dependency_provider<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        let provider = self.inner.read().providers.get(key).cloned()?;
        provider.downcast_ref::<T>().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScopeEvent> {
        self.events.subscribe()
    }

    /// Notifies subscribers; returns how many received the event.
    pub fn emit(&self, event: ScopeEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
