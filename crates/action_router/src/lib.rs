use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use host::{ActionHost, DomEvent, Listener, ListenerOptions};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use shared::{
    domain::{ListenerId, NodeId, DEFAULT_ACTION_EVENTS},
    payload::{extract_action_payload, ActionPayload},
};
use tracing::debug;

pub const ACTION_ATTRIBUTE: &str = "data-action";
pub const ACTION_EVENT_ATTRIBUTE: &str = "data-action-event";
pub const PREVENT_DEFAULT_ATTRIBUTE: &str = "data-action-prevent-default";
pub const STOP_PROPAGATION_ATTRIBUTE: &str = "data-action-stop-propagation";

pub type ActionHandler = Arc<dyn Fn(ActionPayload, &DispatchContext<'_>) + Send + Sync>;
pub type UnhandledObserver = Arc<dyn Fn(&str, &UnhandledAction<'_>) + Send + Sync>;

/// Wraps a closure as an [`ActionHandler`] for [`ActionRouter::register_many`].
pub fn action<F>(handler: F) -> ActionHandler
where
    F: Fn(ActionPayload, &DispatchContext<'_>) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Values shared with every handler, keyed by type.
#[derive(Clone, Default)]
pub struct SharedContext {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T>(mut self, value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Arc::make_mut(&mut self.values).insert(TypeId::of::<T>(), value);
        self
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.values
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("values", &self.values.len())
            .finish()
    }
}

/// Per-dispatch view handed to a handler. Lives only for the handler call.
pub struct DispatchContext<'a> {
    pub context: &'a SharedContext,
    pub action_name: &'a str,
    pub event: &'a DomEvent,
    pub element: NodeId,
    pub host: &'a dyn ActionHost,
}

impl DispatchContext<'_> {
    pub fn shared<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.context.get::<T>()
    }

    pub fn element_attribute(&self, name: &str) -> Option<String> {
        self.host.attribute(self.element, name)
    }

    pub fn element_value(&self) -> Option<String> {
        self.host.form_value(self.element)
    }
}

pub struct UnhandledAction<'a> {
    pub event: &'a DomEvent,
    pub element: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMiss {
    NoHost,
    NoActionElement,
    EmptyActionName,
    EventKindNotAllowed,
    UnknownAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    NotHandled(DispatchMiss),
}

impl DispatchOutcome {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

#[derive(Clone, Default)]
pub struct RouterOptions {
    pub host: Option<Arc<dyn ActionHost>>,
    /// Defaults to the host's root.
    pub root: Option<NodeId>,
    /// Empty means [`DEFAULT_ACTION_EVENTS`].
    pub event_types: Vec<String>,
    pub context: SharedContext,
    pub on_unhandled: Option<UnhandledObserver>,
}

impl RouterOptions {
    pub fn with_host(mut self, host: Arc<dyn ActionHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_event_types<I, S>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = event_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: SharedContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_on_unhandled<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &UnhandledAction<'_>) + Send + Sync + 'static,
    {
        self.on_unhandled = Some(Arc::new(observer));
        self
    }
}

struct RouterInner {
    host: Option<Arc<dyn ActionHost>>,
    root: Option<NodeId>,
    event_types: Vec<String>,
    context: SharedContext,
    on_unhandled: Option<UnhandledObserver>,
    handlers: RwLock<IndexMap<String, ActionHandler>>,
    listeners: Mutex<IndexMap<String, ListenerId>>,
}

#[derive(Clone)]
pub struct ActionRouter {
    inner: Arc<RouterInner>,
}

impl ActionRouter {
    pub fn new(options: RouterOptions) -> Self {
        let RouterOptions {
            host,
            root,
            event_types,
            context,
            on_unhandled,
        } = options;

        let mut kinds: Vec<String> = Vec::new();
        for kind in event_types {
            if !kind.is_empty() && !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            kinds = DEFAULT_ACTION_EVENTS.iter().map(|kind| kind.to_string()).collect();
        }

        let root = root.or_else(|| host.as_ref().map(|host| host.root()));

        Self {
            inner: Arc::new(RouterInner {
                host,
                root,
                event_types: kinds,
                context,
                on_unhandled,
                handlers: RwLock::new(IndexMap::new()),
                listeners: Mutex::new(IndexMap::new()),
            }),
        }
    }

    pub fn event_types(&self) -> &[String] {
        &self.inner.event_types
    }

    pub fn register<N, F>(&self, name: N, handler: F)
    where
        N: Into<String>,
        F: Fn(ActionPayload, &DispatchContext<'_>) + Send + Sync + 'static,
    {
        self.register_handler(name, Arc::new(handler));
    }

    /// Last registration for a name wins.
    pub fn register_handler(&self, name: impl Into<String>, handler: ActionHandler) {
        let name = name.into();
        if name.is_empty() {
            debug!("router: ignoring registration without an action name");
            return;
        }

        let replaced = self
            .inner
            .handlers
            .write()
            .insert(name.clone(), handler)
            .is_some();
        debug!(action = %name, replaced, "router: action registered");
    }

    pub fn register_many<I, N>(&self, handlers: I)
    where
        I: IntoIterator<Item = (N, ActionHandler)>,
        N: Into<String>,
    {
        for (name, handler) in handlers {
            self.register_handler(name, handler);
        }
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.inner.handlers.write().shift_remove(name).is_some()
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.inner.handlers.read().contains_key(name)
    }

    /// Snapshot of registered names in registration order.
    pub fn registered_actions(&self) -> Vec<String> {
        self.inner.handlers.read().keys().cloned().collect()
    }

    pub fn dispatch(&self, event: &DomEvent) -> DispatchOutcome {
        self.inner.dispatch(event)
    }

    /// Binds one listener per event kind at the root. Returns `false` when the
    /// root is unusable or the router is already installed.
    pub fn install(&self) -> bool {
        let Some((host, root)) = self.inner.usable_root() else {
            debug!("router: install skipped, root is unusable");
            return false;
        };

        let mut listeners = self.inner.listeners.lock();
        if !listeners.is_empty() {
            return false;
        }

        for kind in &self.inner.event_types {
            let router = Arc::downgrade(&self.inner);
            let listener: Listener = Arc::new(move |event: &DomEvent| {
                if let Some(router) = router.upgrade() {
                    router.dispatch(event);
                }
            });
            if let Some(id) = host.add_event_listener(root, kind, listener, ListenerOptions::default())
            {
                listeners.insert(kind.clone(), id);
            }
        }

        debug!(root = root.0, kinds = listeners.len(), "router: installed");
        !listeners.is_empty()
    }

    /// Removes exactly the listeners bound by [`ActionRouter::install`].
    pub fn uninstall(&self) {
        let bound: Vec<(String, ListenerId)> = self.inner.listeners.lock().drain(..).collect();
        if bound.is_empty() {
            return;
        }

        let (Some(host), Some(root)) = (self.inner.host.as_deref(), self.inner.root) else {
            return;
        };
        for (kind, id) in &bound {
            host.remove_event_listener(root, kind, *id);
        }
        debug!(root = root.0, kinds = bound.len(), "router: uninstalled");
    }

    pub fn is_installed(&self) -> bool {
        !self.inner.listeners.lock().is_empty()
    }
}

impl RouterInner {
    fn usable_root(&self) -> Option<(&dyn ActionHost, NodeId)> {
        let host = self.host.as_deref()?;
        let root = self.root?;
        host.contains(root).then_some((host, root))
    }

    fn dispatch(&self, event: &DomEvent) -> DispatchOutcome {
        let Some(host) = self.host.as_deref() else {
            return DispatchOutcome::NotHandled(DispatchMiss::NoHost);
        };

        let Some(element) = event
            .target()
            .and_then(|target| host.closest_with_attribute(target, ACTION_ATTRIBUTE))
        else {
            return DispatchOutcome::NotHandled(DispatchMiss::NoActionElement);
        };

        let action_name = host
            .attribute(element, ACTION_ATTRIBUTE)
            .unwrap_or_default();
        if action_name.is_empty() {
            return DispatchOutcome::NotHandled(DispatchMiss::EmptyActionName);
        }

        let allowed = host.attribute(element, ACTION_EVENT_ATTRIBUTE);
        if !accepts_event_kind(allowed.as_deref(), event.kind()) {
            debug!(action = %action_name, kind = event.kind(), "router: event kind not allowed");
            return DispatchOutcome::NotHandled(DispatchMiss::EventKindNotAllowed);
        }

        let handler = self.handlers.read().get(&action_name).cloned();
        let Some(handler) = handler else {
            debug!(action = %action_name, "router: unhandled action");
            if let Some(observer) = &self.on_unhandled {
                observer(&action_name, &UnhandledAction { event, element });
            }
            return DispatchOutcome::NotHandled(DispatchMiss::UnknownAction);
        };

        if is_flag_set(host, element, PREVENT_DEFAULT_ATTRIBUTE) {
            event.prevent_default();
        }
        if is_flag_set(host, element, STOP_PROPAGATION_ATTRIBUTE) {
            event.stop_propagation();
        }

        let payload = extract_action_payload(host.dataset(element));
        let context = DispatchContext {
            context: &self.context,
            action_name: &action_name,
            event,
            element,
            host,
        };
        handler(payload, &context);

        DispatchOutcome::Handled
    }
}

fn is_flag_set(host: &dyn ActionHost, element: NodeId, attribute: &str) -> bool {
    host.attribute(element, attribute).as_deref() == Some("true")
}

/// Parses a comma-separated allow-list; blank entries are dropped and a list
/// with no entries counts as absent.
pub fn parse_action_event_list(raw: &str) -> Option<Vec<&str>> {
    let kinds: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .collect();
    (!kinds.is_empty()).then_some(kinds)
}

fn accepts_event_kind(allow_list: Option<&str>, kind: &str) -> bool {
    match allow_list.and_then(parse_action_event_list) {
        Some(kinds) => kinds.contains(&kind),
        None => true,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
