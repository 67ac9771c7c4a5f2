use super::*;
use crate::test_support::{names, record_globals, Calls, Fixture};
use host::{CallOutcome, DomEvent};
use legacy_runtime::AdapterOptions;
use parking_lot::Mutex;
use std::sync::Arc;

fn fixture(globals: &[&str]) -> (Fixture, Calls) {
    let fixture = Fixture::new();
    let calls = record_globals(&fixture.scope, globals);
    register(
        &fixture.router,
        LegacyRuntimeAdapter::globals_only(fixture.scope.clone(), AdapterOptions::default()),
    );
    (fixture, calls)
}

#[test]
fn article_sale_form_actions_forward_to_legacy_globals() {
    let (fixture, calls) = fixture(&["showArticleSale", "closeForm"]);
    for action_name in ["open-article-sale-form", "close-article-sale-form"] {
        let button = fixture.button(&[("data-action", action_name)]);
        fixture.router.dispatch(&DomEvent::targeted("click", button));
    }

    let calls = calls.lock();
    assert_eq!(calls[0], ("showArticleSale".to_string(), vec![]));
    assert_eq!(
        calls[1],
        ("closeForm".to_string(), vec![json!("articleSaleForm")])
    );
}

#[test]
fn remark_actions_need_a_key() {
    let (fixture, calls) = fixture(&["addDeliveryRemarkByKey"]);
    let without = fixture.button(&[("data-action", "add-delivery-remark")]);
    let with = fixture.button(&[
        ("data-action", "add-delivery-remark"),
        ("data-arg-remark-key", "delivery.remarks.neighbours"),
    ]);
    fixture.router.dispatch(&DomEvent::targeted("click", without));
    fixture.router.dispatch(&DomEvent::targeted("click", with));

    assert_eq!(
        *calls.lock(),
        vec![(
            "addDeliveryRemarkByKey".to_string(),
            vec![json!("delivery.remarks.neighbours")]
        )]
    );
}

#[test]
fn delivery_date_keyboard_activation() {
    let (fixture, calls) = fixture(&["selectDeliveryDateByString"]);
    let day = fixture.button(&[
        ("data-action", "select-delivery-date"),
        ("data-arg-date", "2026-10-20"),
    ]);

    let tab = DomEvent::targeted("keydown", day).with_key("Tab");
    fixture.router.dispatch(&tab);
    assert!(!tab.default_prevented());
    assert!(calls.lock().is_empty());

    let enter = DomEvent::targeted("keydown", day).with_key("Enter");
    fixture.router.dispatch(&enter);
    assert!(enter.default_prevented());

    let space = DomEvent::targeted("keydown", day).with_key(" ");
    fixture.router.dispatch(&space);

    fixture.router.dispatch(&DomEvent::targeted("click", day));

    let calls = calls.lock();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, vec![json!("2026-10-20")]);
    assert_eq!(calls[1].1, vec![json!("2026-10-20")]);
    assert_eq!(calls[2].1.len(), 2);
    assert_eq!(calls[2].1[1]["type"], json!("click"));
}

#[tokio::test]
async fn calendar_navigation_needs_a_nonzero_direction() {
    let fixture = Fixture::new();
    let directions = Arc::new(Mutex::new(Vec::new()));
    let sink = directions.clone();
    fixture
        .scope
        .define_function("navigateCalendar", move |args: &[Value]| {
            let sink = sink.clone();
            let direction = args.first().cloned();
            CallOutcome::pending(async move {
                sink.lock().extend(direction);
                Ok(())
            })
        });
    register(
        &fixture.router,
        LegacyRuntimeAdapter::globals_only(fixture.scope.clone(), AdapterOptions::default()),
    );

    for direction in ["0", "sideways", "-1", "1"] {
        let button = fixture.button(&[
            ("data-action", "navigate-delivery-calendar"),
            ("data-arg-direction", direction),
        ]);
        fixture.router.dispatch(&DomEvent::targeted("click", button));
    }
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    assert_eq!(*directions.lock(), vec![json!(-1), json!(1)]);
}

#[test]
fn missing_legacy_globals_degrade_to_a_warning() {
    let (fixture, calls) = fixture(&[]);
    let button = fixture.button(&[("data-action", "open-article-sale-form")]);
    assert!(fixture
        .router
        .dispatch(&DomEvent::targeted("click", button))
        .is_handled());
    assert!(names(&calls).is_empty());
}
