use action_router::ActionRouter;
use legacy_runtime::LegacyRuntimeAdapter;
use serde_json::{json, Value};
use shared::domain::KEYDOWN;

use super::{json_number, numeric_value, present_text};

pub const ARTICLE_SALE_FORM_ID: &str = "articleSaleForm";

fn is_activation_key(key: Option<&str>) -> bool {
    matches!(key, Some("Enter" | " " | "Spacebar"))
}

pub fn register(router: &ActionRouter, legacy: LegacyRuntimeAdapter) {
    let bridge = legacy.clone();
    router.register("open-article-sale-form", move |_payload, _context| {
        bridge.invoke("showArticleSale", Vec::new());
    });

    let bridge = legacy.clone();
    router.register("close-article-sale-form", move |_payload, _context| {
        bridge.invoke("closeForm", vec![json!(ARTICLE_SALE_FORM_ID)]);
    });

    let bridge = legacy.clone();
    router.register("submit-article-sale-form", move |_payload, context| {
        bridge.invoke_async("createArticleSale", vec![context.event.describe()]);
    });

    let bridge = legacy.clone();
    router.register("add-delivery-remark", move |payload, _context| {
        if let Some(key) = present_text(&payload, "remarkKey") {
            bridge.invoke("addDeliveryRemarkByKey", vec![Value::String(key)]);
        }
    });

    let bridge = legacy.clone();
    router.register("add-delivery-remark-modal", move |payload, _context| {
        if let Some(key) = present_text(&payload, "remarkKey") {
            bridge.invoke("addDeliveryRemarkToModalByKey", vec![Value::String(key)]);
        }
    });

    let bridge = legacy.clone();
    router.register("select-recommended-delivery-date", move |_payload, context| {
        bridge.invoke_async("selectRecommendedDate", vec![context.event.describe()]);
    });

    let bridge = legacy.clone();
    router.register("navigate-delivery-calendar", move |payload, context| {
        let Some(direction) = numeric_value(payload.get("direction"))
            .filter(|direction| *direction != 0.0)
            .and_then(json_number)
        else {
            return;
        };
        bridge.invoke_async(
            "navigateCalendar",
            vec![Value::Number(direction), context.event.describe()],
        );
    });

    router.register("select-delivery-date", move |payload, context| {
        let Some(date) = present_text(&payload, "date") else {
            return;
        };

        if context.event.kind() == KEYDOWN {
            if !is_activation_key(context.event.key()) {
                return;
            }
            context.event.prevent_default();
            legacy.invoke("selectDeliveryDateByString", vec![Value::String(date)]);
            return;
        }

        legacy.invoke(
            "selectDeliveryDateByString",
            vec![Value::String(date), context.event.describe()],
        );
    });
}

#[cfg(test)]
#[path = "../tests/order_tests.rs"]
mod tests;
