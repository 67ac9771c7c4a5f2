use super::*;
use crate::slices::delivery_remarks::{DeliveryRemarksDependencies, REMARKS_FIELD_ID};
use action_router::{DispatchMiss, DispatchOutcome};
use dependency_bridge::{fixed, publish_legacy_provider};
use host::{CallOutcome, DomEvent, ScopeEvent};
use parking_lot::Mutex;
use serde_json::Value;
use shared::domain::{NodeId, DEFAULT_ACTION_EVENTS, INPUT};

fn compose_with_document() -> (Document, Workspace) {
    let document = Document::new();
    let workspace = Workspace::compose(
        Settings::default(),
        GlobalScope::with_document(document.clone()),
        SharedState::new(),
    )
    .expect("compose");
    (document, workspace)
}

fn action_button(document: &Document, attributes: &[(&str, &str)]) -> NodeId {
    let node = document.create_element("button");
    for (name, value) in attributes {
        document.set_attribute(node, name, *value);
    }
    document.append_child(document.body(), node);
    node
}

#[test]
fn composition_installs_the_router_and_records_its_actions() {
    let (document, workspace) = compose_with_document();

    assert!(workspace.router().is_installed());
    for kind in DEFAULT_ACTION_EVENTS.iter().chain([&INPUT]) {
        assert_eq!(document.listener_count(document.root(), kind), 1, "{kind}");
    }

    let snapshot = workspace.state().snapshot();
    assert!(snapshot.router_initialized);
    assert_eq!(snapshot.registered_actions, workspace.router().registered_actions());
    for action_name in [
        "open-article-sale-form",
        "edit-delivery-remarks",
        "queue.accept-next",
        "agent-status.set",
        "select-subscription-role-person",
    ] {
        assert!(
            snapshot.registered_actions.iter().any(|name| name == action_name),
            "{action_name}"
        );
    }

    workspace.shutdown();
    assert_eq!(document.listener_count(document.root(), "click"), 0);
}

#[test]
fn migrated_remarks_handler_replaces_the_legacy_forwarding() {
    let (document, workspace) = compose_with_document();
    let forwarded = Arc::new(Mutex::new(0));
    let sink = forwarded.clone();
    workspace
        .scope()
        .define_function("addDeliveryRemarkToModalByKey", move |_args: &[Value]| {
            *sink.lock() += 1;
            CallOutcome::Completed
        });
    let field = action_button(&document, &[("id", REMARKS_FIELD_ID)]);
    document.set_value(field, "");
    let button = action_button(
        &document,
        &[
            ("data-action", "add-delivery-remark-modal"),
            ("data-arg-remark-key", "Achterom"),
        ],
    );

    document.dispatch_event(&DomEvent::targeted("click", button));

    assert_eq!(*forwarded.lock(), 0);
    assert_eq!(document.value(field).as_deref(), Some("Achterom"));
}

#[test]
fn call_agent_actions_reach_the_runtime_namespace() {
    let (document, workspace) = compose_with_document();
    let accepted = Arc::new(Mutex::new(0));
    let sink = accepted.clone();
    workspace.scope().set_namespace(
        "kiwiCallAgentRuntime",
        Arc::new(host::FunctionTable::new().with("acceptNextCall", move |_args: &[Value]| {
            *sink.lock() += 1;
            CallOutcome::Completed
        })),
    );
    let button = action_button(&document, &[("data-action", "queue.accept-next")]);

    document.dispatch_event(&DomEvent::targeted("click", button));
    document.dispatch_event(&DomEvent::targeted("input", button));

    assert_eq!(*accepted.lock(), 2);
}

#[test]
fn unknown_actions_are_reported_not_handled() {
    let (document, workspace) = compose_with_document();
    let button = action_button(&document, &[("data-action", "winback.open")]);
    assert_eq!(
        workspace
            .router()
            .dispatch(&DomEvent::targeted("click", button)),
        DispatchOutcome::NotHandled(DispatchMiss::UnknownAction)
    );
}

#[test]
fn handlers_find_the_shared_state_in_their_context() {
    let (document, workspace) = compose_with_document();
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    workspace.router().register("probe", move |_payload, context| {
        *sink.lock() = context
            .shared::<SharedState>()
            .map(|state| state.is_router_initialized());
    });
    let button = action_button(&document, &[("data-action", "probe")]);

    document.dispatch_event(&DomEvent::targeted("click", button));
    assert_eq!(*seen.lock(), Some(true));
}

#[test]
fn remarks_dependencies_published_later_are_found() {
    struct NoCustomer;
    impl DeliveryRemarksDependencies for NoCustomer {
        fn translate(&self, _key: &str, _fallback: &str) -> String {
            "Bij de buren afgeven".to_string()
        }
    }

    let (document, workspace) = compose_with_document();
    let field = action_button(&document, &[("id", REMARKS_FIELD_ID)]);
    document.set_value(field, "");
    assert!(workspace.delivery_remarks().dependencies().resolve().is_none());

    publish_legacy_provider::<dyn DeliveryRemarksDependencies>(
        workspace.scope(),
        DELIVERY_REMARKS_PROVIDER_KEY,
        fixed(Arc::new(NoCustomer) as Arc<dyn DeliveryRemarksDependencies>),
    );
    workspace
        .delivery_remarks()
        .add_delivery_remark_to_modal_by_key("delivery.remarks.neighbours");

    assert_eq!(
        document.value(field).as_deref(),
        Some("Bij de buren afgeven")
    );
}

#[tokio::test]
async fn legacy_bootstrap_requests_the_bundle_once() {
    let (document, workspace) = compose_with_document();
    let mut events = workspace.scope().subscribe();

    let first = workspace.bootstrap_legacy();
    let second = workspace.bootstrap_legacy();
    let settle = async {
        tokio::task::yield_now().await;
        let requested = document.take_requested_resources();
        assert_eq!(requested.len(), 1);
        assert_eq!(
            requested[0].1,
            "http://127.0.0.1:8000/static/assets/js/app.js"
        );
        document.finish_resource(requested[0].0, true);
    };

    let (first, second, ()) = futures::join!(first, second, settle);
    assert_eq!((first, second), (Ok(()), Ok(())));
    assert!(workspace.state().is_legacy_script_loaded());
    assert_eq!(events.try_recv(), Ok(ScopeEvent::LegacyReady));
}

#[tokio::test]
async fn failed_bootstrap_is_returned_and_retryable() {
    let (document, workspace) = compose_with_document();

    let attempt = workspace.bootstrap_legacy();
    let fail = async {
        tokio::task::yield_now().await;
        let requested = document.take_requested_resources();
        document.finish_resource(requested[0].0, false);
    };
    let (result, ()) = futures::join!(attempt, fail);
    assert!(result.expect_err("rejected").is_rejected());
    assert!(!workspace.state().snapshot().legacy_load_in_flight);

    let retry = workspace.bootstrap_legacy();
    let settle = async {
        tokio::task::yield_now().await;
        let requested = document.take_requested_resources();
        document.finish_resource(requested[0].0, true);
    };
    let (result, ()) = futures::join!(retry, settle);
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn headless_composition_skips_listeners_and_loading() {
    let workspace = Workspace::compose(Settings::default(), GlobalScope::new(), SharedState::new())
        .expect("compose");

    assert!(!workspace.router().is_installed());
    assert!(workspace.state().is_router_initialized());
    assert_eq!(workspace.bootstrap_legacy().await, Ok(()));
    assert!(workspace.state().is_legacy_script_loaded());
}

#[test]
fn unusable_asset_base_fails_composition() {
    let settings = Settings {
        asset_base_url: "relative/only".into(),
        ..Settings::default()
    };
    assert!(matches!(
        Workspace::compose(settings, GlobalScope::new(), SharedState::new()),
        Err(SettingsError::InvalidUrl { .. })
    ));
}
