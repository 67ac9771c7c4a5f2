use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use futures::{
    channel::oneshot,
    future::{self, FutureExt},
};
use host::{ActionHost, Document, DomEvent, GlobalScope, ListenerOptions, ScopeEvent, WeakDocument};
use parking_lot::Mutex;
use shared::{
    domain::{ListenerId, NodeId, ERROR, LOAD},
    error::{LoadFailure, ScriptLoadError},
};
use tracing::{debug, error, info};
use url::Url;

use crate::state::{LoadTask, SharedState};

pub const LOADED_ATTRIBUTE: &str = "data-loaded";
pub const LEGACY_SCRIPT_ID: &str = "kiwi-legacy-app-script";
/// Location of the legacy bundle relative to the module bundle.
pub const LEGACY_SCRIPT_RELATIVE_URL: &str = "../app.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub id: String,
    pub url: String,
}

impl ScriptRequest {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

pub fn resolve_script_url(base: &str, relative: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(base)?.join(relative)?.to_string())
}

fn settled() -> LoadTask {
    future::ready(Ok(())).boxed().shared()
}

#[derive(Clone, Default)]
pub struct ScriptLoader {
    document: Option<Document>,
    in_flight: Arc<Mutex<HashMap<String, LoadTask>>>,
}

impl ScriptLoader {
    /// Loader over `document`. Without a document every request resolves
    /// immediately, which keeps headless composition working.
    pub fn new(document: Option<Document>) -> Self {
        Self {
            document,
            in_flight: Arc::default(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn ensure_loaded(&self, request: &ScriptRequest) -> LoadTask {
        let Some(document) = self.document.as_ref() else {
            debug!(id = %request.id, "loader: no document, nothing to load");
            return settled();
        };
        if request.id.is_empty() || request.url.is_empty() {
            return settled();
        }

        let mut in_flight = self.in_flight.lock();
        if let Some(task) = in_flight.get(&request.id) {
            debug!(id = %request.id, "loader: joining in-flight load");
            return task.clone();
        }

        if let Some(existing) = document.get_element_by_id(&request.id) {
            if document.attribute(existing, LOADED_ATTRIBUTE).as_deref() == Some("true") {
                return settled();
            }
            // Someone else inserted the node; wait for it to settle.
            let task = self.watch(document, existing, request);
            in_flight.insert(request.id.clone(), task.clone());
            return task;
        }

        let script = document.create_element("script");
        document.set_attribute(script, "id", request.id.as_str());
        document.set_attribute(script, "src", request.url.as_str());
        let task = self.watch(document, script, request);
        in_flight.insert(request.id.clone(), task.clone());
        drop(in_flight);

        document.append_child(document.head(), script);
        info!(id = %request.id, url = %request.url, "loader: script requested");
        task
    }

    fn watch(&self, document: &Document, node: NodeId, request: &ScriptRequest) -> LoadTask {
        let (tx, rx) = oneshot::channel::<Result<(), ScriptLoadError>>();
        let watch = Arc::new(Watch {
            node,
            id: request.id.clone(),
            url: request.url.clone(),
            document: document.downgrade(),
            in_flight: Arc::downgrade(&self.in_flight),
            sender: Mutex::new(Some(tx)),
            listeners: Mutex::new(Vec::new()),
        });

        let mut listeners = Vec::with_capacity(2);
        for kind in [LOAD, ERROR] {
            let watch = watch.clone();
            let listener = Arc::new(move |_event: &DomEvent| {
                let result = if kind == LOAD {
                    Ok(())
                } else {
                    Err(watch.failure(LoadFailure::Rejected, "host reported an error event"))
                };
                watch.settle(result);
            });
            if let Some(id) =
                document.add_event_listener(node, kind, listener, ListenerOptions::once())
            {
                listeners.push((kind, id));
            }
        }
        *watch.listeners.lock() = listeners;

        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => {
                    if let Some(in_flight) = watch.in_flight.upgrade() {
                        in_flight.lock().remove(&watch.id);
                    }
                    Err(watch.failure(LoadFailure::Abandoned, "host dropped the pending load"))
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Settles one pending script node. Runs from whichever of its `load` or
/// `error` listeners fires first, whether or not anyone awaits the task.
struct Watch {
    node: NodeId,
    id: String,
    url: String,
    document: WeakDocument,
    in_flight: Weak<Mutex<HashMap<String, LoadTask>>>,
    sender: Mutex<Option<oneshot::Sender<Result<(), ScriptLoadError>>>>,
    listeners: Mutex<Vec<(&'static str, ListenerId)>>,
}

impl Watch {
    fn failure(&self, failure: LoadFailure, message: &str) -> ScriptLoadError {
        ScriptLoadError::new(self.id.as_str(), self.url.as_str(), failure, message)
    }

    fn settle(&self, result: Result<(), ScriptLoadError>) {
        let Some(tx) = self.sender.lock().take() else {
            return;
        };
        if let Some(in_flight) = self.in_flight.upgrade() {
            in_flight.lock().remove(&self.id);
        }

        if let Some(document) = self.document.upgrade() {
            let listeners = std::mem::take(&mut *self.listeners.lock());
            for (kind, listener) in listeners {
                document.remove_event_listener(self.node, kind, listener);
            }
            match &result {
                Ok(()) => {
                    document.set_attribute(self.node, LOADED_ATTRIBUTE, "true");
                }
                // Drop the failed node so a later request starts over.
                Err(_) => {
                    document.remove_node(self.node);
                }
            }
        }

        match &result {
            Ok(()) => info!(id = %self.id, "loader: script loaded"),
            Err(err) => error!(id = %self.id, error = %err, "loader: script failed"),
        }
        let _ = tx.send(result);
    }
}

/// Loads the legacy bundle exactly once per process, tracked in
/// [`SharedState`].
#[derive(Clone)]
pub struct LegacyAppLoader {
    state: SharedState,
    loader: ScriptLoader,
    scope: GlobalScope,
    request: ScriptRequest,
}

impl LegacyAppLoader {
    pub fn new(
        state: SharedState,
        loader: ScriptLoader,
        scope: GlobalScope,
        request: ScriptRequest,
    ) -> Self {
        Self {
            state,
            loader,
            scope,
            request,
        }
    }

    pub fn request(&self) -> &ScriptRequest {
        &self.request
    }

    /// Resolves once the bundle is loaded. A failed load is forgotten so the
    /// next call tries again.
    pub fn ensure_loaded(&self) -> LoadTask {
        let task = self.state.join_or_start_legacy_load(|| {
            let pending = self.loader.ensure_loaded(&self.request);
            let state = self.state.clone();
            let scope = self.scope.clone();
            async move {
                match pending.await {
                    Ok(()) => {
                        state.mark_legacy_script_loaded();
                        let notified = scope.emit(ScopeEvent::LegacyReady);
                        debug!(notified, "loader: legacy bundle ready");
                        Ok(())
                    }
                    Err(err) => {
                        state.set_legacy_load_task(None);
                        Err(err)
                    }
                }
            }
            .boxed()
            .shared()
        });
        task.unwrap_or_else(settled)
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
