use std::sync::Arc;

use action_router::{ActionRouter, RouterOptions};
use host::{CallOutcome, Document, FunctionTable, GlobalScope};
use parking_lot::Mutex;
use serde_json::Value;
use shared::domain::NodeId;

pub type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

pub struct Fixture {
    pub document: Document,
    pub scope: GlobalScope,
    pub router: ActionRouter,
}

impl Fixture {
    pub fn new() -> Self {
        let document = Document::new();
        let scope = GlobalScope::with_document(document.clone());
        let router = ActionRouter::new(RouterOptions::default().with_host(Arc::new(document.clone())));
        Self {
            document,
            scope,
            router,
        }
    }

    /// Appends an element carrying `attributes` to the body.
    pub fn element(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.document.create_element(tag);
        for (name, value) in attributes {
            self.document.set_attribute(node, name, *value);
        }
        self.document.append_child(self.document.body(), node);
        node
    }

    pub fn button(&self, attributes: &[(&str, &str)]) -> NodeId {
        self.element("button", attributes)
    }
}

fn recording_table(calls: &Calls, names: &[&str]) -> FunctionTable {
    let table = FunctionTable::new();
    for name in names {
        let sink = calls.clone();
        let label = name.to_string();
        table.define(*name, move |args: &[Value]| {
            sink.lock().push((label.clone(), args.to_vec()));
            CallOutcome::Completed
        });
    }
    table
}

/// Installs recording functions under `namespace`.
pub fn record_namespace(scope: &GlobalScope, namespace: &str, names: &[&str]) -> Calls {
    let calls: Calls = Arc::default();
    scope.set_namespace(namespace, Arc::new(recording_table(&calls, names)));
    calls
}

/// Defines recording loose functions on the scope.
pub fn record_globals(scope: &GlobalScope, names: &[&str]) -> Calls {
    let calls: Calls = Arc::default();
    for name in names {
        let sink = calls.clone();
        let label = name.to_string();
        scope.define_function(*name, move |args: &[Value]| {
            sink.lock().push((label.clone(), args.to_vec()));
            CallOutcome::Completed
        });
    }
    calls
}

pub fn names(calls: &Calls) -> Vec<String> {
    calls.lock().iter().map(|(name, _)| name.clone()).collect()
}
