//! Typed clients over the two legacy runtime namespaces.

use host::{DomEvent, GlobalScope};
use serde_json::{json, Number, Value};
use tokio::task::JoinHandle;

use crate::adapter::{AdapterOptions, LegacyRuntimeAdapter, Resolution};

pub const CALL_AGENT_RUNTIME_NAMESPACE: &str = "kiwiCallAgentRuntime";
pub const SUBSCRIPTION_ROLE_RUNTIME_NAMESPACE: &str = "kiwiSubscriptionRoleRuntime";

#[derive(Clone)]
pub struct CallAgentRuntimeClient {
    adapter: LegacyRuntimeAdapter,
}

impl CallAgentRuntimeClient {
    pub fn new(scope: GlobalScope, options: AdapterOptions) -> Self {
        Self::with_namespace(scope, CALL_AGENT_RUNTIME_NAMESPACE, options)
    }

    pub fn with_namespace(
        scope: GlobalScope,
        namespace: impl Into<String>,
        options: AdapterOptions,
    ) -> Self {
        Self {
            adapter: LegacyRuntimeAdapter::namespaced(scope, namespace, "call-agent runtime", options),
        }
    }

    pub fn adapter(&self) -> &LegacyRuntimeAdapter {
        &self.adapter
    }

    fn invoke(&self, method: &str, args: Vec<Value>) -> Resolution {
        self.adapter.invoke(method, args)
    }

    pub fn accept_next_call(&self) -> Resolution {
        self.invoke("acceptNextCall", Vec::new())
    }

    pub fn cancel_disposition(&self) -> Resolution {
        self.invoke("cancelDisposition", Vec::new())
    }

    pub fn close_debug_modal(&self) -> Resolution {
        self.invoke("closeDebugModal", Vec::new())
    }

    pub fn debug_clear_queue(&self) -> Resolution {
        self.invoke("debugClearQueue", Vec::new())
    }

    pub fn debug_end_call(&self) -> Resolution {
        self.invoke("debugEndCall", Vec::new())
    }

    pub fn debug_generate_queue(&self) -> Resolution {
        self.invoke("debugGenerateQueue", Vec::new())
    }

    pub fn debug_start_call(&self) -> Resolution {
        self.invoke("debugStartCall", Vec::new())
    }

    pub fn end_call_session(&self) -> Resolution {
        self.invoke("endCallSession", Vec::new())
    }

    pub fn full_reset(&self) -> Resolution {
        self.invoke("fullReset", Vec::new())
    }

    pub fn identify_caller_as_customer(&self, customer_id: Value) -> Resolution {
        self.invoke("identifyCallerAsCustomer", vec![customer_id])
    }

    pub fn identify_current_customer_as_caller(&self) -> Resolution {
        self.invoke("identifyCurrentCustomerAsCaller", Vec::new())
    }

    pub fn manual_finish_acw(&self) -> Resolution {
        self.invoke("manualFinishACW", Vec::new())
    }

    pub fn save_disposition(&self) -> Resolution {
        self.invoke("saveDisposition", Vec::new())
    }

    pub fn set_agent_status(&self, status: &str) -> Resolution {
        self.invoke("setAgentStatus", vec![json!(status)])
    }

    pub fn toggle_call_hold(&self) -> Resolution {
        self.invoke("toggleCallHold", Vec::new())
    }

    pub fn toggle_follow_up_section(&self) -> Resolution {
        self.invoke("toggleFollowUpSection", Vec::new())
    }

    pub fn toggle_known_caller_select(&self) -> Resolution {
        self.invoke("toggleKnownCallerSelect", Vec::new())
    }

    /// Legacy code only sees a description of the triggering event.
    pub fn toggle_status_menu(&self, event: &DomEvent) -> Resolution {
        self.invoke("toggleStatusMenu", vec![event.describe()])
    }

    pub fn update_disposition_outcomes(&self) -> Resolution {
        self.invoke("updateDispositionOutcomes", Vec::new())
    }
}

#[derive(Clone)]
pub struct SubscriptionRoleRuntimeClient {
    adapter: LegacyRuntimeAdapter,
}

impl SubscriptionRoleRuntimeClient {
    pub fn new(scope: GlobalScope, options: AdapterOptions) -> Self {
        Self::with_namespace(scope, SUBSCRIPTION_ROLE_RUNTIME_NAMESPACE, options)
    }

    pub fn with_namespace(
        scope: GlobalScope,
        namespace: impl Into<String>,
        options: AdapterOptions,
    ) -> Self {
        Self {
            adapter: LegacyRuntimeAdapter::namespaced(scope, namespace, "subscription-role runtime", options),
        }
    }

    pub fn adapter(&self) -> &LegacyRuntimeAdapter {
        &self.adapter
    }

    pub fn acknowledge_subscription_duplicate_warning(&self, role: &str) -> Resolution {
        self.adapter
            .invoke("acknowledgeSubscriptionDuplicateWarning", vec![json!(role)])
    }

    /// The search runs asynchronously in legacy code; failures are logged.
    pub fn search_subscription_role_person(&self, role: &str) -> Option<JoinHandle<()>> {
        self.adapter
            .invoke_async("searchSubscriptionRolePerson", vec![json!(role)])
    }

    pub fn select_subscription_duplicate_person(&self, role: &str, person_id: Number) -> Resolution {
        self.adapter.invoke(
            "selectSubscriptionDuplicatePerson",
            vec![json!(role), Value::Number(person_id)],
        )
    }

    pub fn select_subscription_role_person(&self, role: &str, person_id: Number) -> Resolution {
        self.adapter.invoke(
            "selectSubscriptionRolePerson",
            vec![json!(role), Value::Number(person_id)],
        )
    }

    pub fn set_subscription_role_mode(&self, role: &str, mode: &str) -> Resolution {
        self.adapter
            .invoke("setSubscriptionRoleMode", vec![json!(role), json!(mode)])
    }

    pub fn toggle_customer_form_address(&self, prefix: &str) -> Resolution {
        self.adapter
            .invoke("toggleCustomerFormAddress", vec![json!(prefix)])
    }

    pub fn toggle_requester_same_as_recipient(&self) -> Resolution {
        self.adapter
            .invoke("toggleRequesterSameAsRecipient", Vec::new())
    }

    pub fn toggle_subscription_duplicate_matches(&self, role: &str) -> Resolution {
        self.adapter
            .invoke("toggleSubscriptionDuplicateMatches", vec![json!(role)])
    }
}

#[cfg(test)]
#[path = "tests/clients_tests.rs"]
mod tests;
