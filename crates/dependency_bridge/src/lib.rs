use std::sync::Arc;

use host::GlobalScope;
use parking_lot::RwLock;
use tracing::debug;

pub type DependencyResolver<D> = Arc<dyn Fn() -> Option<Arc<D>> + Send + Sync>;

pub struct DependencySlot<D: ?Sized> {
    area: &'static str,
    resolver: RwLock<Option<DependencyResolver<D>>>,
}

impl<D: ?Sized> DependencySlot<D> {
    pub fn new(area: &'static str) -> Self {
        Self {
            area,
            resolver: RwLock::new(None),
        }
    }

    pub fn area(&self) -> &'static str {
        self.area
    }

    /// Installs or, with `None`, clears the resolver. Last write wins.
    pub fn configure(&self, resolver: Option<DependencyResolver<D>>) {
        let configured = resolver.is_some();
        *self.resolver.write() = resolver;
        debug!(area = self.area, configured, "bridge: resolver configured");
    }

    pub fn configure_with<F>(&self, resolver: F)
    where
        F: Fn() -> Option<Arc<D>> + Send + Sync + 'static,
    {
        self.configure(Some(Arc::new(resolver)));
    }

    pub fn clear(&self) {
        self.configure(None);
    }

    pub fn is_configured(&self) -> bool {
        self.resolver.read().is_some()
    }

    /// Calls the current resolver. Never cached, so reconfiguration applies to
    /// the very next operation.
    pub fn resolve(&self) -> Option<Arc<D>> {
        let resolver = self.resolver.read().clone();
        let dependencies = resolver.and_then(|resolve| resolve());
        if dependencies.is_none() {
            debug!(area = self.area, "bridge: dependencies unavailable");
        }
        dependencies
    }
}

/// Resolver that always yields the same bag.
pub fn fixed<D>(dependencies: Arc<D>) -> DependencyResolver<D>
where
    D: ?Sized + Send + Sync + 'static,
{
    Arc::new(move || Some(dependencies.clone()))
}

/// Publishes a provider the legacy bundle exposes for one area.
pub fn publish_legacy_provider<D>(
    scope: &GlobalScope,
    key: impl Into<String>,
    provider: DependencyResolver<D>,
) where
    D: ?Sized + 'static,
{
    scope.set_dependency_provider(key, provider);
}

/// Resolver that looks the legacy provider up in `scope` on every call, so a
/// provider published after configuration is still found.
pub fn legacy_provider_resolver<D>(scope: GlobalScope, key: impl Into<String>) -> DependencyResolver<D>
where
    D: ?Sized + 'static,
{
    let key = key.into();
    Arc::new(move || {
        let provider = scope.dependency_provider::<DependencyResolver<D>>(&key)?;
        provider()
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
