use action_router::ActionRouter;
use legacy_runtime::CallAgentRuntimeClient;

use super::runtime_action;

pub fn register(router: &ActionRouter, runtime: CallAgentRuntimeClient) {
    router.register_many([
        (
            "debug.close-modal",
            runtime_action(&runtime, |runtime| {
                runtime.close_debug_modal();
            }),
        ),
        (
            "debug.toggle-known-caller",
            runtime_action(&runtime, |runtime| {
                runtime.toggle_known_caller_select();
            }),
        ),
        (
            "debug.start-call",
            runtime_action(&runtime, |runtime| {
                runtime.debug_start_call();
            }),
        ),
        (
            "debug.end-call",
            runtime_action(&runtime, |runtime| {
                runtime.debug_end_call();
            }),
        ),
        (
            "debug.full-reset",
            runtime_action(&runtime, |runtime| {
                runtime.full_reset();
            }),
        ),
    ]);
}
