use super::*;
use futures::FutureExt;

const BUNDLE_URL: &str = "https://agent.example/static/assets/app.js";

fn scripts_with_id(document: &Document, id: &str) -> usize {
    document
        .children(document.head())
        .into_iter()
        .filter(|node| document.attribute(*node, "id").as_deref() == Some(id))
        .count()
}

#[tokio::test]
async fn without_a_document_loading_resolves_immediately() {
    let loader = ScriptLoader::new(None);
    let task = loader.ensure_loaded(&ScriptRequest::new("kiwi-x", BUNDLE_URL));
    assert_eq!(task.await, Ok(()));
}

#[tokio::test]
async fn empty_id_or_url_resolves_without_touching_the_document() {
    let document = Document::new();
    let loader = ScriptLoader::new(Some(document.clone()));

    assert_eq!(loader.ensure_loaded(&ScriptRequest::new("", BUNDLE_URL)).await, Ok(()));
    assert_eq!(loader.ensure_loaded(&ScriptRequest::new("kiwi-x", "")).await, Ok(()));
    assert!(document.take_requested_resources().is_empty());
}

#[tokio::test]
async fn concurrent_requests_share_one_script_node() {
    let document = Document::new();
    let loader = ScriptLoader::new(Some(document.clone()));
    let request = ScriptRequest::new("kiwi-x", BUNDLE_URL);

    let first = loader.ensure_loaded(&request);
    let second = loader.ensure_loaded(&request);
    assert_eq!(scripts_with_id(&document, "kiwi-x"), 1);
    assert_eq!(loader.in_flight(), 1);

    let requested = document.take_requested_resources();
    assert_eq!(requested.len(), 1);
    let (node, url) = &requested[0];
    assert_eq!(url, BUNDLE_URL);
    document.finish_resource(*node, true);

    let (first, second) = futures::join!(first, second);
    assert_eq!((first, second), (Ok(()), Ok(())));
    assert_eq!(
        document.attribute(*node, LOADED_ATTRIBUTE).as_deref(),
        Some("true")
    );
    assert_eq!(loader.in_flight(), 0);

    // Loaded marker short-circuits later requests.
    assert_eq!(loader.ensure_loaded(&request).await, Ok(()));
    assert_eq!(scripts_with_id(&document, "kiwi-x"), 1);
    assert!(document.take_requested_resources().is_empty());
}

#[tokio::test]
async fn failure_reaches_every_waiter_and_a_fresh_request_retries() {
    let document = Document::new();
    let loader = ScriptLoader::new(Some(document.clone()));
    let request = ScriptRequest::new("kiwi-x", BUNDLE_URL);

    let first = loader.ensure_loaded(&request);
    let second = loader.ensure_loaded(&request);
    let (node, _) = document.take_requested_resources()[0].clone();
    document.finish_resource(node, false);

    let (first, second) = futures::join!(first, second);
    let error = first.expect_err("load rejected");
    assert!(error.is_rejected());
    assert_eq!(error.id, "kiwi-x");
    assert_eq!(second, Err(error));
    assert_eq!(scripts_with_id(&document, "kiwi-x"), 0);

    let retry = loader.ensure_loaded(&request);
    let requested = document.take_requested_resources();
    assert_eq!(requested.len(), 1);
    document.finish_resource(requested[0].0, true);
    assert_eq!(retry.await, Ok(()));
}

#[tokio::test]
async fn failure_with_no_waiter_still_frees_the_request() {
    let document = Document::new();
    let loader = ScriptLoader::new(Some(document.clone()));
    let request = ScriptRequest::new("kiwi-x", BUNDLE_URL);

    drop(loader.ensure_loaded(&request));
    let (node, _) = document.take_requested_resources()[0].clone();
    document.finish_resource(node, false);

    assert_eq!(loader.in_flight(), 0);
    assert_eq!(scripts_with_id(&document, "kiwi-x"), 0);

    let retry = loader.ensure_loaded(&request);
    let requested = document.take_requested_resources();
    assert_eq!(requested.len(), 1);
    assert_ne!(requested[0].0, node);
    document.finish_resource(requested[0].0, true);
    assert_eq!(retry.await, Ok(()));
}

#[tokio::test]
async fn settling_detaches_both_listeners() {
    let document = Document::new();
    let loader = ScriptLoader::new(Some(document.clone()));

    let task = loader.ensure_loaded(&ScriptRequest::new("kiwi-x", BUNDLE_URL));
    let (node, _) = document.take_requested_resources()[0].clone();
    assert_eq!(document.listener_count(node, "load"), 1);
    assert_eq!(document.listener_count(node, "error"), 1);

    document.finish_resource(node, true);
    assert_eq!(document.listener_count(node, "load"), 0);
    assert_eq!(document.listener_count(node, "error"), 0);
    assert_eq!(loader.in_flight(), 0);
    assert_eq!(task.await, Ok(()));
}

#[tokio::test]
async fn foreign_marker_node_is_joined_rather_than_duplicated() {
    let document = Document::new();
    let foreign = document.create_element("script");
    document.set_attribute(foreign, "id", "kiwi-x");
    document.append_child(document.body(), foreign);

    let loader = ScriptLoader::new(Some(document.clone()));
    let task = loader.ensure_loaded(&ScriptRequest::new("kiwi-x", BUNDLE_URL));
    assert_eq!(scripts_with_id(&document, "kiwi-x"), 0);
    assert!(task.clone().now_or_never().is_none());

    document.finish_resource(foreign, true);
    assert_eq!(task.await, Ok(()));
}

#[tokio::test]
async fn already_loaded_marker_resolves_at_once() {
    let document = Document::new();
    let existing = document.create_element("script");
    document.set_attribute(existing, "id", "kiwi-x");
    document.set_attribute(existing, LOADED_ATTRIBUTE, "true");
    document.append_child(document.head(), existing);

    let loader = ScriptLoader::new(Some(document.clone()));
    let task = loader.ensure_loaded(&ScriptRequest::new("kiwi-x", BUNDLE_URL));
    assert_eq!(task.now_or_never(), Some(Ok(())));
    assert_eq!(loader.in_flight(), 0);
}

#[test]
fn legacy_url_is_resolved_against_the_module_base() {
    assert_eq!(
        resolve_script_url(
            "https://agent.example/static/assets/js/app/index.js",
            LEGACY_SCRIPT_RELATIVE_URL
        )
        .as_deref(),
        Ok("https://agent.example/static/assets/js/app.js")
    );
    assert!(resolve_script_url("not a url", LEGACY_SCRIPT_RELATIVE_URL).is_err());
}

fn legacy_loader(document: &Document, state: &SharedState, scope: &GlobalScope) -> LegacyAppLoader {
    LegacyAppLoader::new(
        state.clone(),
        ScriptLoader::new(Some(document.clone())),
        scope.clone(),
        ScriptRequest::new(LEGACY_SCRIPT_ID, BUNDLE_URL),
    )
}

#[tokio::test]
async fn legacy_bundle_loads_once_and_announces_readiness() {
    let document = Document::new();
    let state = SharedState::new();
    let scope = GlobalScope::with_document(document.clone());
    let mut ready = scope.subscribe();
    let loader = legacy_loader(&document, &state, &scope);

    let first = loader.ensure_loaded();
    let second = loader.ensure_loaded();
    assert!(state.snapshot().legacy_load_in_flight);

    let requested = document.take_requested_resources();
    assert_eq!(requested.len(), 1);
    document.finish_resource(requested[0].0, true);

    let (first, second) = futures::join!(first, second);
    assert_eq!((first, second), (Ok(()), Ok(())));
    assert!(state.is_legacy_script_loaded());
    assert_eq!(ready.try_recv(), Ok(ScopeEvent::LegacyReady));

    assert_eq!(loader.ensure_loaded().await, Ok(()));
    assert!(document.take_requested_resources().is_empty());
}

#[tokio::test]
async fn failed_legacy_load_is_forgotten() {
    let document = Document::new();
    let state = SharedState::new();
    let scope = GlobalScope::with_document(document.clone());
    let loader = legacy_loader(&document, &state, &scope);

    let attempt = loader.ensure_loaded();
    document.finish_resource(document.take_requested_resources()[0].0, false);
    assert!(attempt.await.is_err());
    assert!(state.legacy_load_task().is_none());
    assert!(!state.is_legacy_script_loaded());

    let retry = loader.ensure_loaded();
    let requested = document.take_requested_resources();
    assert_eq!(requested.len(), 1);
    document.finish_resource(requested[0].0, true);
    assert_eq!(retry.await, Ok(()));
    assert!(state.is_legacy_script_loaded());
}
