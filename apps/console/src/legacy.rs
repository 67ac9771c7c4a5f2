use std::sync::Arc;

use agent_workspace::{
    slices::delivery_remarks::{
        ContactHistoryEntry, ContactHistoryOptions, Customer, DeliveryRemarksDependencies,
        SharedCustomer, DELIVERY_REMARKS_PROVIDER_KEY,
    },
    Settings,
};
use dependency_bridge::{fixed, publish_legacy_provider};
use host::{CallOutcome, Document, FunctionTable, GlobalScope};
use parking_lot::Mutex;
use serde_json::Value;
use shared::domain::ToastKind;
use tracing::{info, warn};

pub const CALL_AGENT_FUNCTIONS: &[&str] = &[
    "acceptNextCall",
    "cancelDisposition",
    "closeDebugModal",
    "debugClearQueue",
    "debugEndCall",
    "debugGenerateQueue",
    "debugStartCall",
    "endCallSession",
    "fullReset",
    "identifyCallerAsCustomer",
    "identifyCurrentCustomerAsCaller",
    "manualFinishACW",
    "saveDisposition",
    "setAgentStatus",
    "toggleCallHold",
    "toggleFollowUpSection",
    "toggleKnownCallerSelect",
    "toggleStatusMenu",
    "updateDispositionOutcomes",
];

pub const SUBSCRIPTION_ROLE_FUNCTIONS: &[&str] = &[
    "acknowledgeSubscriptionDuplicateWarning",
    "selectSubscriptionDuplicatePerson",
    "selectSubscriptionRolePerson",
    "setSubscriptionRoleMode",
    "toggleCustomerFormAddress",
    "toggleRequesterSameAsRecipient",
    "toggleSubscriptionDuplicateMatches",
];

/// Async in the legacy bundle; they hand back pending work. The first lives in
/// the subscription-role namespace, the rest are order globals.
const ASYNC_FUNCTIONS: &[&str] = &[
    "searchSubscriptionRolePerson",
    "createArticleSale",
    "selectRecommendedDate",
];

pub const ORDER_GLOBALS: &[&str] = &[
    "showArticleSale",
    "closeForm",
    "addDeliveryRemarkByKey",
    "addDeliveryRemarkToModalByKey",
    "navigateCalendar",
    "selectDeliveryDateByString",
];

pub type Journal = Arc<Mutex<Vec<String>>>;

pub struct LegacyBundle {
    journal: Journal,
    customer: SharedCustomer,
}

impl Default for LegacyBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyBundle {
    pub fn new() -> Self {
        Self {
            journal: Journal::default(),
            customer: Arc::new(Mutex::new(Customer {
                id: 1001,
                first_name: "Anna".into(),
                last_name: "de Vries".into(),
                ..Customer::default()
            })),
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn customer(&self) -> &SharedCustomer {
        &self.customer
    }

    /// Settles every resource the document was asked to load. On success the
    /// bundle's globals are published before the load event fires.
    pub fn settle(
        &self,
        document: &Document,
        scope: &GlobalScope,
        settings: &Settings,
        fail: bool,
    ) -> usize {
        let requested = document.take_requested_resources();
        for (node, url) in &requested {
            if fail {
                warn!(url = %url, "legacy bundle: simulated load failure");
                document.finish_resource(*node, false);
                continue;
            }
            self.publish(scope, settings);
            info!(url = %url, "legacy bundle: evaluated");
            document.finish_resource(*node, true);
        }
        requested.len()
    }

    pub fn publish(&self, scope: &GlobalScope, settings: &Settings) {
        let call_agent = self.table(CALL_AGENT_FUNCTIONS.iter().copied());
        scope.set_namespace(settings.call_agent_namespace.clone(), Arc::new(call_agent));

        let subscription_role = self.table(
            SUBSCRIPTION_ROLE_FUNCTIONS
                .iter()
                .chain(&ASYNC_FUNCTIONS[..1])
                .copied(),
        );
        scope.set_namespace(
            settings.subscription_role_namespace.clone(),
            Arc::new(subscription_role),
        );

        for name in ORDER_GLOBALS.iter().chain(&ASYNC_FUNCTIONS[1..]) {
            let journal = self.journal.clone();
            let name = name.to_string();
            scope.define_function(name.clone(), move |args: &[Value]| {
                record(&journal, &name, args)
            });
        }

        let desk = Arc::new(DemoDesk {
            customer: self.customer.clone(),
            journal: self.journal.clone(),
        });
        publish_legacy_provider::<dyn DeliveryRemarksDependencies>(
            scope,
            DELIVERY_REMARKS_PROVIDER_KEY,
            fixed(desk as Arc<dyn DeliveryRemarksDependencies>),
        );
    }

    fn table<'a>(&self, names: impl Iterator<Item = &'a str>) -> FunctionTable {
        let table = FunctionTable::new();
        for name in names {
            let journal = self.journal.clone();
            let label = name.to_string();
            table.define(name, move |args: &[Value]| record(&journal, &label, args));
        }
        table
    }
}

fn record(journal: &Journal, name: &str, args: &[Value]) -> CallOutcome {
    let args = Value::Array(args.to_vec());
    info!(function = name, args = %args, "legacy bundle: called");
    journal.lock().push(name.to_string());
    if ASYNC_FUNCTIONS.contains(&name) {
        CallOutcome::pending(async { Ok(()) })
    } else {
        CallOutcome::Completed
    }
}

struct DemoDesk {
    customer: SharedCustomer,
    journal: Journal,
}

impl DeliveryRemarksDependencies for DemoDesk {
    fn current_customer(&self) -> Option<SharedCustomer> {
        Some(self.customer.clone())
    }

    fn agent_name(&self) -> Option<String> {
        Some("Console agent".to_string())
    }

    fn show_toast(&self, message: &str, kind: ToastKind) {
        info!(kind = kind.as_str(), text = message, "legacy bundle: toast");
        self.journal.lock().push(format!("toast:{}", kind.as_str()));
    }

    fn push_contact_history(
        &self,
        customer: &Customer,
        entry: ContactHistoryEntry,
        _options: ContactHistoryOptions,
    ) {
        info!(
            customer_id = customer.id,
            description = %entry.description,
            "legacy bundle: contact history"
        );
        self.journal.lock().push(format!("history:{}", entry.kind));
    }

    fn save_customers(&self) {
        self.journal.lock().push("saveCustomers".to_string());
    }
}

#[cfg(test)]
#[path = "tests/legacy_tests.rs"]
mod tests;
