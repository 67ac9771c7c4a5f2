use action_router::ActionRouter;
use legacy_runtime::CallAgentRuntimeClient;

use super::runtime_action;

pub fn register(router: &ActionRouter, runtime: CallAgentRuntimeClient) {
    router.register_many([
        (
            "queue.accept-next",
            runtime_action(&runtime, |runtime| {
                runtime.accept_next_call();
            }),
        ),
        (
            "queue.debug-generate",
            runtime_action(&runtime, |runtime| {
                runtime.debug_generate_queue();
            }),
        ),
        (
            "queue.debug-clear",
            runtime_action(&runtime, |runtime| {
                runtime.debug_clear_queue();
            }),
        ),
    ]);
}
