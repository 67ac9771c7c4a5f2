use super::*;
use agent_workspace::Workspace;
use host::DomEvent;
use legacy_runtime::SharedState;

fn workspace() -> (Document, GlobalScope, Workspace) {
    let document = Document::new();
    let scope = GlobalScope::with_document(document.clone());
    let workspace =
        Workspace::compose(Settings::default(), scope.clone(), SharedState::new()).expect("compose");
    (document, scope, workspace)
}

fn button(document: &Document, action: &str) -> shared::domain::NodeId {
    let node = document.create_element("button");
    document.set_attribute(node, "data-action", action);
    document.append_child(document.body(), node);
    node
}

#[tokio::test]
async fn settled_bundle_serves_migrated_actions() {
    let (document, scope, workspace) = workspace();
    let bundle = LegacyBundle::new();

    let (loaded, settled) = tokio::join!(workspace.bootstrap_legacy(), async {
        tokio::task::yield_now().await;
        bundle.settle(&document, &scope, workspace.settings(), false)
    });
    assert_eq!(settled, 1);
    assert!(loaded.is_ok());
    assert!(workspace.state().is_legacy_script_loaded());

    let accept = button(&document, "queue.accept-next");
    document.dispatch_event(&DomEvent::targeted("click", accept));
    let article = button(&document, "open-article-sale-form");
    document.dispatch_event(&DomEvent::targeted("click", article));

    assert_eq!(
        *bundle.journal().lock(),
        vec!["acceptNextCall".to_string(), "showArticleSale".to_string()]
    );
}

#[tokio::test]
async fn failed_bundle_leaves_no_globals() {
    let (document, scope, workspace) = workspace();
    let bundle = LegacyBundle::new();

    let (loaded, _) = tokio::join!(workspace.bootstrap_legacy(), async {
        tokio::task::yield_now().await;
        bundle.settle(&document, &scope, workspace.settings(), true)
    });

    assert!(loaded.is_err());
    assert!(scope.namespace("kiwiCallAgentRuntime").is_none());
    assert!(!workspace.state().is_legacy_script_loaded());

    let accept = button(&document, "queue.accept-next");
    document.dispatch_event(&DomEvent::targeted("click", accept));
    assert!(bundle.journal().lock().is_empty());
}

#[tokio::test]
async fn provider_backs_the_remarks_editor() {
    let (document, scope, workspace) = workspace();
    let bundle = LegacyBundle::new();
    bundle.publish(&scope, workspace.settings());

    let field = document.create_element("textarea");
    document.set_attribute(field, "id", "editCustomerDeliveryRemarks");
    document.append_child(document.body(), field);
    document.set_value(field, "  Achterom ");

    workspace.delivery_remarks().save_delivery_remarks().await;

    assert_eq!(bundle.customer().lock().delivery_remarks.default, "Achterom");
    assert_eq!(
        *bundle.journal().lock(),
        vec![
            "history:Bezorgvoorkeuren gewijzigd".to_string(),
            "saveCustomers".to_string(),
            "toast:success".to_string(),
        ]
    );
}
