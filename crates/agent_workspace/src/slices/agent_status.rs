use action_router::{action, ActionRouter};
use legacy_runtime::CallAgentRuntimeClient;

use super::present_text;

pub const STATUS_OPTION_ATTRIBUTE: &str = "data-status-option";

pub fn register(router: &ActionRouter, runtime: CallAgentRuntimeClient) {
    let menu = runtime.clone();
    router.register_many([
        (
            "agent-status.toggle-menu",
            action(move |_payload, context| {
                menu.toggle_status_menu(context.event);
            }),
        ),
        (
            "agent-status.set",
            action(move |payload, context| {
                let requested = present_text(&payload, "status").or_else(|| {
                    context
                        .element_attribute(STATUS_OPTION_ATTRIBUTE)
                        .filter(|status| !status.is_empty())
                });
                if let Some(status) = requested {
                    runtime.set_agent_status(&status);
                }
            }),
        ),
    ]);
}
