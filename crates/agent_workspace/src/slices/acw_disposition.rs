use action_router::ActionRouter;
use legacy_runtime::CallAgentRuntimeClient;

use super::runtime_action;

pub fn register(router: &ActionRouter, runtime: CallAgentRuntimeClient) {
    router.register_many([
        (
            "acw.manual-finish",
            runtime_action(&runtime, |runtime| {
                runtime.manual_finish_acw();
            }),
        ),
        (
            "disposition.update-outcomes",
            runtime_action(&runtime, |runtime| {
                runtime.update_disposition_outcomes();
            }),
        ),
        (
            "disposition.toggle-follow-up",
            runtime_action(&runtime, |runtime| {
                runtime.toggle_follow_up_section();
            }),
        ),
        (
            "disposition.cancel",
            runtime_action(&runtime, |runtime| {
                runtime.cancel_disposition();
            }),
        ),
        (
            "disposition.save",
            runtime_action(&runtime, |runtime| {
                runtime.save_disposition();
            }),
        ),
    ]);
}
