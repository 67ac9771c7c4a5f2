use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener {
    let counter = counter.clone();
    Arc::new(move |_event: &DomEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn new_document_has_head_and_body_connected() {
    let document = Document::new();
    assert!(document.is_connected(document.head()));
    assert!(document.is_connected(document.body()));
    assert_eq!(document.tag_name(document.root()).as_deref(), Some("#document"));
    assert_eq!(
        document.parent_of(document.body()),
        Some(document.document_element())
    );
}

#[test]
fn events_bubble_to_the_root_until_propagation_stops() {
    let document = Document::new();
    let button = document.create_element("button");
    document.append_child(document.body(), button);

    let at_root = Arc::new(AtomicUsize::new(0));
    document.add_event_listener(
        document.root(),
        "click",
        counting_listener(&at_root),
        ListenerOptions::default(),
    );
    document.dispatch_event(&DomEvent::targeted("click", button));
    assert_eq!(at_root.load(Ordering::SeqCst), 1);

    document.add_event_listener(
        document.body(),
        "click",
        Arc::new(|event: &DomEvent| event.stop_propagation()),
        ListenerOptions::default(),
    );
    document.dispatch_event(&DomEvent::targeted("click", button));
    assert_eq!(at_root.load(Ordering::SeqCst), 1);
}

#[test]
fn once_listeners_fire_a_single_time() {
    let document = Document::new();
    let node = document.create_element("div");
    document.append_child(document.body(), node);

    let calls = Arc::new(AtomicUsize::new(0));
    document.add_event_listener(node, "load", counting_listener(&calls), ListenerOptions::once());
    document.dispatch_event(&DomEvent::targeted("load", node));
    document.dispatch_event(&DomEvent::targeted("load", node));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(document.listener_count(node, "load"), 0);
}

#[test]
fn prevent_default_requires_cancelable_event() {
    let event = DomEvent::new("submit").with_cancelable(false);
    event.prevent_default();
    assert!(!event.default_prevented());

    let event = DomEvent::new("submit");
    event.prevent_default();
    assert!(event.default_prevented());
}

#[test]
fn lookup_by_id_ignores_detached_elements() {
    let document = Document::new();
    let detached = document.create_element("div");
    document.set_attribute(detached, "id", "panel");
    assert_eq!(document.get_element_by_id("panel"), None);

    document.append_child(document.body(), detached);
    assert_eq!(document.get_element_by_id("panel"), Some(detached));
}

#[test]
fn dataset_exposes_camel_cased_data_attributes() {
    let document = Document::new();
    let node = document.create_element("button");
    document.set_attribute(node, "class", "primary");
    document.set_attribute(node, "data-action", "queue.accept-next");
    document.set_attribute(node, "data-arg-customer-id", "81");

    assert_eq!(
        document.dataset(node),
        vec![
            ("action".to_string(), "queue.accept-next".to_string()),
            ("argCustomerId".to_string(), "81".to_string()),
        ]
    );
}

#[test]
fn closest_with_attribute_includes_the_start_node() {
    let document = Document::new();
    let row = document.create_element("tr");
    let cell = document.create_element("td");
    document.set_attribute(row, "data-action", "select-customer");
    document.append_child(document.body(), row);
    document.append_child(row, cell);

    assert_eq!(document.closest_with_attribute(cell, "data-action"), Some(row));
    assert_eq!(document.closest_with_attribute(row, "data-action"), Some(row));
    assert_eq!(
        document.closest_with_attribute(document.body(), "data-action"),
        None
    );
}

#[test]
fn connected_scripts_become_requested_resources() {
    let document = Document::new();
    let script = document.create_element("script");
    document.set_attribute(script, "src", "https://cdn.test/app.js");
    document.append_child(document.head(), script);

    assert_eq!(
        document.take_requested_resources(),
        vec![(script, "https://cdn.test/app.js".to_string())]
    );
    assert!(document.take_requested_resources().is_empty());
}

#[test]
fn removing_a_node_drops_its_subtree_and_listeners() {
    let document = Document::new();
    let parent = document.create_element("div");
    let child = document.create_element("span");
    document.append_child(document.body(), parent);
    document.append_child(parent, child);
    document.add_event_listener(
        child,
        "click",
        Arc::new(|_event: &DomEvent| {}),
        ListenerOptions::default(),
    );

    assert!(document.remove_node(parent));
    assert!(!document.contains(child));
    assert_eq!(document.listener_count(child, "click"), 0);
    assert!(!document.remove_node(document.root()));
}

#[test]
fn append_child_rejects_cycles() {
    let document = Document::new();
    let outer = document.create_element("div");
    let inner = document.create_element("div");
    document.append_child(outer, inner);

    assert!(!document.append_child(inner, outer));
    assert!(!document.append_child(outer, outer));
}
