//! Recipient/requester selection on the subscription form.

use action_router::{ActionRouter, DispatchContext};
use legacy_runtime::SubscriptionRoleRuntimeClient;
use serde_json::{Number, Value};
use shared::payload::ActionPayload;

use super::{json_number, numeric_value, present_text};

pub const RECIPIENT: &str = "recipient";
pub const REQUESTER: &str = "requester";
pub const DEFAULT_ROLE_MODE: &str = "existing";

fn supported_role(payload: &ActionPayload) -> Option<&str> {
    payload
        .get("role")
        .and_then(Value::as_str)
        .filter(|role| *role == RECIPIENT || *role == REQUESTER)
}

fn person_id(payload: &ActionPayload) -> Option<Number> {
    numeric_value(payload.get("personId")).and_then(json_number)
}

/// Mode from the payload, else the control's current value, else the default.
fn role_mode(payload: &ActionPayload, context: &DispatchContext<'_>) -> String {
    payload
        .get("mode")
        .and_then(Value::as_str)
        .filter(|mode| !mode.is_empty())
        .map(str::to_string)
        .or_else(|| context.element_value())
        .unwrap_or_else(|| DEFAULT_ROLE_MODE.to_string())
}

pub fn register(router: &ActionRouter, runtime: SubscriptionRoleRuntimeClient) {
    let rt = runtime.clone();
    router.register("toggle-customer-form-address", move |payload, _context| {
        if let Some(prefix) = present_text(&payload, "prefix") {
            rt.toggle_customer_form_address(&prefix);
        }
    });

    let rt = runtime.clone();
    router.register("set-subscription-role-mode", move |payload, context| {
        if let Some(role) = supported_role(&payload) {
            rt.set_subscription_role_mode(role, &role_mode(&payload, context));
        }
    });

    let rt = runtime.clone();
    router.register("search-subscription-role-person", move |payload, _context| {
        if let Some(role) = supported_role(&payload) {
            rt.search_subscription_role_person(role);
        }
    });

    let rt = runtime.clone();
    router.register("toggle-requester-same-as-recipient", move |_payload, _context| {
        rt.toggle_requester_same_as_recipient();
    });

    let rt = runtime.clone();
    router.register("select-subscription-duplicate-person", move |payload, _context| {
        let Some(role) = supported_role(&payload) else {
            return;
        };
        if let Some(id) = person_id(&payload) {
            rt.select_subscription_duplicate_person(role, id);
        }
    });

    let rt = runtime.clone();
    router.register("toggle-subscription-duplicate-matches", move |payload, _context| {
        if let Some(role) = supported_role(&payload) {
            rt.toggle_subscription_duplicate_matches(role);
        }
    });

    let rt = runtime.clone();
    router.register("acknowledge-subscription-duplicate-warning", move |payload, _context| {
        if let Some(role) = supported_role(&payload) {
            rt.acknowledge_subscription_duplicate_warning(role);
        }
    });

    router.register("select-subscription-role-person", move |payload, _context| {
        let Some(role) = supported_role(&payload) else {
            return;
        };
        if let Some(id) = person_id(&payload) {
            runtime.select_subscription_role_person(role, id);
        }
    });
}

#[cfg(test)]
#[path = "../tests/subscription_role_tests.rs"]
mod tests;
