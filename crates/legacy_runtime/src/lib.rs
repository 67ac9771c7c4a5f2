pub mod adapter;
pub mod clients;
pub mod loader;
pub mod state;

pub use adapter::{
    AdapterOptions, LegacyRuntimeAdapter, Resolution, RuntimeLogger, TracingLogger,
    DEFAULT_LOG_PREFIX,
};
pub use clients::{
    CallAgentRuntimeClient, SubscriptionRoleRuntimeClient, CALL_AGENT_RUNTIME_NAMESPACE,
    SUBSCRIPTION_ROLE_RUNTIME_NAMESPACE,
};
pub use loader::{
    resolve_script_url, LegacyAppLoader, ScriptLoader, ScriptRequest, LEGACY_SCRIPT_ID,
    LEGACY_SCRIPT_RELATIVE_URL, LOADED_ATTRIBUTE,
};
pub use state::{LoadTask, SharedState, SharedStateSnapshot};
