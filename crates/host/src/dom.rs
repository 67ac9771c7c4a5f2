use std::{
    cell::Cell,
    collections::HashMap,
    sync::{Arc, Weak},
};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared::{
    domain::{ListenerId, NodeId, ERROR, LOAD},
    payload::dataset_key,
};
use tracing::debug;

pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub once: bool,
}

impl ListenerOptions {
    pub fn once() -> Self {
        Self { once: true }
    }
}

/// A platform event as delivered to listeners.
#[derive(Debug)]
pub struct DomEvent {
    kind: String,
    target: Option<NodeId>,
    key: Option<String>,
    bubbles: bool,
    cancelable: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            key: None,
            bubbles: true,
            cancelable: true,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn targeted(kind: impl Into<String>, target: NodeId) -> Self {
        Self::new(kind).with_target(target)
    }

    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Has no effect on events that are not cancelable.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Plain-data view handed to legacy functions that expect the event.
    pub fn describe(&self) -> Value {
        json!({
            "type": self.kind,
            "target": self.target.map(|node| node.0),
            "key": self.key,
        })
    }
}

/// What an action router needs from its host: ancestor search over the element
/// tree, dataset access, and listener registration on a root node.
pub trait ActionHost: Send + Sync {
    /// Default subscription root.
    fn root(&self) -> NodeId;
    fn contains(&self, node: NodeId) -> bool;
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn dataset(&self, node: NodeId) -> Vec<(String, String)>;
    fn form_value(&self, node: NodeId) -> Option<String>;
    fn add_event_listener(
        &self,
        node: NodeId,
        kind: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> Option<ListenerId>;
    fn remove_event_listener(&self, node: NodeId, kind: &str, id: ListenerId) -> bool;

    /// Nearest node, starting at `node` itself, that carries `name`.
    fn closest_with_attribute(&self, node: NodeId, name: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.attribute(candidate, name).is_some() {
                return Some(candidate);
            }
            current = self.parent_of(candidate);
        }
        None
    }
}

struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    text: String,
    value: Option<String>,
}

impl NodeData {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            text: String::new(),
            value: None,
        }
    }
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    kind: String,
    once: bool,
    listener: Listener,
}

struct DocumentInner {
    nodes: HashMap<NodeId, NodeData>,
    listeners: Vec<ListenerEntry>,
    requested_resources: Vec<NodeId>,
    root: NodeId,
    document_element: NodeId,
    head: NodeId,
    body: NodeId,
    next_node: u64,
    next_listener: u64,
}

impl DocumentInner {
    fn allocate(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, NodeData::new(tag));
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(&child).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|candidate| *candidate != child);
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == self.root {
                return true;
            }
            current = self.nodes.get(&candidate).and_then(|data| data.parent);
        }
        false
    }

    fn path_to_root(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.contains_key(&node).then_some(node);
        while let Some(candidate) = current {
            path.push(candidate);
            current = self.nodes.get(&candidate).and_then(|data| data.parent);
        }
        path
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut stack = vec![node];
        while let Some(candidate) = stack.pop() {
            if let Some(data) = self.nodes.get(&candidate) {
                collected.push(candidate);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        collected
    }

    /// Clones the listeners bound to `(node, kind)` and drops `once` entries.
    fn take_listeners(&mut self, node: NodeId, kind: &str) -> Vec<Listener> {
        let mut matched = Vec::new();
        self.listeners.retain(|entry| {
            if entry.node != node || entry.kind != kind {
                return true;
            }
            matched.push(entry.listener.clone());
            !entry.once
        });
        matched
    }
}

#[derive(Clone)]
pub struct Document {
    inner: Arc<Mutex<DocumentInner>>,
}

#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<Mutex<DocumentInner>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            nodes: HashMap::new(),
            listeners: Vec::new(),
            requested_resources: Vec::new(),
            root: NodeId(0),
            document_element: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            next_node: 0,
            next_listener: 1,
        };
        let root = inner.allocate("#document");
        let document_element = inner.allocate("html");
        let head = inner.allocate("head");
        let body = inner.allocate("body");
        inner.attach(root, document_element);
        inner.attach(document_element, head);
        inner.attach(document_element, body);
        inner.root = root;
        inner.document_element = document_element;
        inner.head = head;
        inner.body = body;

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn root(&self) -> NodeId {
        self.inner.lock().root
    }

    pub fn document_element(&self) -> NodeId {
        self.inner.lock().document_element
    }

    pub fn head(&self) -> NodeId {
        self.inner.lock().head
    }

    pub fn body(&self) -> NodeId {
        self.inner.lock().body
    }

    /// Creates a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.lock().allocate(tag)
    }

    /// Moves `child` under `parent`. A connected `script` element with a `src`
    /// becomes a requested resource the host is expected to settle with
    /// [`Document::finish_resource`].
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.lock();
        if parent == child
            || !inner.nodes.contains_key(&parent)
            || !inner.nodes.contains_key(&child)
            || inner.path_to_root(parent).contains(&child)
        {
            return false;
        }

        inner.attach(parent, child);
        let requests_resource = inner.is_connected(child)
            && inner.nodes.get(&child).is_some_and(|node| {
                node.tag.eq_ignore_ascii_case("script") && node.attributes.contains_key("src")
            });
        if requests_resource && !inner.requested_resources.contains(&child) {
            inner.requested_resources.push(child);
        }
        true
    }

    /// Removes `node` and its descendants, along with their listeners.
    pub fn remove_node(&self, node: NodeId) -> bool {
        let mut inner = self.inner.lock();
        if node == inner.root || !inner.nodes.contains_key(&node) {
            return false;
        }

        inner.detach(node);
        let removed = inner.subtree(node);
        for id in &removed {
            inner.nodes.remove(id);
        }
        inner.listeners.retain(|entry| !removed.contains(&entry.node));
        inner
            .requested_resources
            .retain(|resource| !removed.contains(resource));
        true
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.inner.lock().is_connected(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner.lock().nodes.get(&node).map(|data| data.tag.clone())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: impl Into<String>) -> bool {
        match self.inner.lock().nodes.get_mut(&node) {
            Some(data) => {
                data.attributes.insert(name.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .lock()
            .nodes
            .get_mut(&node)
            .is_some_and(|data| data.attributes.shift_remove(name).is_some())
    }

    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .map(|data| {
                data.attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        if let Some(data) = self.inner.lock().nodes.get_mut(&node) {
            data.text = text.into();
        }
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.inner.lock().nodes.get(&node).map(|data| data.text.clone())
    }

    /// Form-control value; `None` for elements that never had one.
    pub fn set_value(&self, node: NodeId, value: impl Into<String>) {
        if let Some(data) = self.inner.lock().nodes.get_mut(&node) {
            data.value = Some(value.into());
        }
    }

    pub fn value(&self, node: NodeId) -> Option<String> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .and_then(|data| data.value.clone())
    }

    /// First connected element, in document order, whose `id` is `element_id`.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        let inner = self.inner.lock();
        inner.subtree(inner.root).into_iter().find(|node| {
            inner
                .nodes
                .get(node)
                .and_then(|data| data.attributes.get("id"))
                .is_some_and(|id| id == element_id)
        })
    }

    pub fn listener_count(&self, node: NodeId, kind: &str) -> usize {
        self.inner
            .lock()
            .listeners
            .iter()
            .filter(|entry| entry.node == node && entry.kind == kind)
            .count()
    }

    /// Delivers `event` to its target and, for bubbling events, every ancestor.
    /// Returns `false` when a listener prevented the default action.
    pub fn dispatch_event(&self, event: &DomEvent) -> bool {
        let Some(target) = event.target() else {
            return true;
        };

        let path = {
            let inner = self.inner.lock();
            let path = inner.path_to_root(target);
            if event.bubbles() {
                path
            } else {
                path.into_iter().take(1).collect()
            }
        };

        for node in path {
            let listeners = self.inner.lock().take_listeners(node, event.kind());
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                break;
            }
        }

        !event.default_prevented()
    }

    /// Drains the resource requests made since the last call, with their URLs.
    pub fn take_requested_resources(&self) -> Vec<(NodeId, String)> {
        let mut inner = self.inner.lock();
        let requested = std::mem::take(&mut inner.requested_resources);
        requested
            .into_iter()
            .filter_map(|node| {
                inner
                    .nodes
                    .get(&node)
                    .and_then(|data| data.attributes.get("src"))
                    .map(|src| (node, src.clone()))
            })
            .collect()
    }

    /// Settles a requested resource by firing `load` or `error` on its node.
    pub fn finish_resource(&self, node: NodeId, loaded: bool) {
        let kind = if loaded { LOAD } else { ERROR };
        debug!(node = node.0, kind, "host: resource settled");
        self.dispatch_event(
            &DomEvent::targeted(kind, node)
                .with_bubbles(false)
                .with_cancelable(false),
        );
    }
}

impl ActionHost for Document {
    fn root(&self) -> NodeId {
        Document::root(self)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.inner.lock().nodes.contains_key(&node)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .and_then(|data| data.parent)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .and_then(|data| data.attributes.get(name).cloned())
    }

    fn dataset(&self, node: NodeId) -> Vec<(String, String)> {
        self.attributes(node)
            .into_iter()
            .filter_map(|(name, value)| dataset_key(&name).map(|key| (key, value)))
            .collect()
    }

    fn form_value(&self, node: NodeId) -> Option<String> {
        Document::value(self, node)
    }

    fn add_event_listener(
        &self,
        node: NodeId,
        kind: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.lock();
        if !inner.nodes.contains_key(&node) {
            return None;
        }

        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push(ListenerEntry {
            id,
            node,
            kind: kind.to_string(),
            once: options.once,
            listener,
        });
        Some(id)
    }

    fn remove_event_listener(&self, node: NodeId, kind: &str, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner
            .listeners
            .retain(|entry| !(entry.id == id && entry.node == node && entry.kind == kind));
        inner.listeners.len() != before
    }
}

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;
