use action_router::{action, ActionRouter};
use legacy_runtime::CallAgentRuntimeClient;
use serde_json::Value;
use shared::payload::ActionPayload;

use super::runtime_action;

fn customer_id(payload: &ActionPayload) -> Option<Value> {
    match payload.get("customerId")? {
        Value::Null => None,
        Value::String(id) if id.is_empty() => None,
        id => Some(id.clone()),
    }
}

pub fn register(router: &ActionRouter, runtime: CallAgentRuntimeClient) {
    router.register_many([
        (
            "call-session.toggle-hold",
            runtime_action(&runtime, |runtime| {
                runtime.toggle_call_hold();
            }),
        ),
        (
            "call-session.end",
            runtime_action(&runtime, |runtime| {
                runtime.end_call_session();
            }),
        ),
        (
            "call-session.identify-current-customer",
            runtime_action(&runtime, |runtime| {
                runtime.identify_current_customer_as_caller();
            }),
        ),
        (
            "call-session.identify-caller",
            action(move |payload, context| {
                // Caller rows sit inside other actionable elements.
                context.event.stop_propagation();
                if let Some(id) = customer_id(&payload) {
                    runtime.identify_caller_as_customer(id);
                }
            }),
        ),
    ]);
}
