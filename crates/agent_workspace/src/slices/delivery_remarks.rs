use std::sync::Arc;

use action_router::ActionRouter;
use chrono::{DateTime, Utc};
use dependency_bridge::{DependencyResolver, DependencySlot};
use futures::future::{self, BoxFuture};
use host::{CallOutcome, Document, FunctionTable, GlobalScope, WeakScope};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::{NodeId, ToastKind};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::present_text;

pub const DELIVERY_REMARKS_SLICE_NAMESPACE: &str = "kiwiDeliveryRemarksSlice";
pub const DELIVERY_REMARKS_PROVIDER_KEY: &str = "getDeliveryRemarksSliceDependencies";

pub const MODAL_ID: &str = "editDeliveryRemarksModal";
pub const CUSTOMER_NAME_ID: &str = "editRemarksCustomerName";
pub const REMARKS_FIELD_ID: &str = "editCustomerDeliveryRemarks";
pub const AGENT_NAME_ID: &str = "agentName";

pub const DEFAULT_PERSONS_API_URL: &str = "/api/v1/persons";
const REMARKS_SAVED_KEY: &str = "delivery.remarksSaved";
const REMARKS_SAVED_FALLBACK: &str = "Bezorgvoorkeuren opgeslagen!";
const SAVE_FAILED_KEY: &str = "delivery.saveFailed";
const SAVE_FAILED_FALLBACK: &str = "Bezorgvoorkeuren opslaan via backend mislukt";
const HISTORY_ENTRY_TYPE: &str = "Bezorgvoorkeuren gewijzigd";
const EMPTY_REMARK_LABEL: &str = "(leeg)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarkRevision {
    pub date: DateTime<Utc>,
    pub remark: String,
    pub updated_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryRemarks {
    pub default: String,
    pub last_updated: Option<DateTime<Utc>>,
    /// Newest first.
    pub history: Vec<RemarkRevision>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub id: u64,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub delivery_remarks: DeliveryRemarks,
}

impl Customer {
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The customer record is owned by the legacy bundle and edited in place.
pub type SharedCustomer = Arc<Mutex<Customer>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactHistoryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactHistoryOptions {
    pub highlight: bool,
    pub persist: bool,
}

pub trait RemarksApi: Send + Sync {
    /// Sends `body` to `url` and returns the decoded response.
    fn put(&self, url: &str, body: Value) -> BoxFuture<'static, anyhow::Result<Value>>;
}

/// Collaborators of this area. Every one is optional.
pub trait DeliveryRemarksDependencies: Send + Sync {
    fn current_customer(&self) -> Option<SharedCustomer> {
        None
    }

    fn translate(&self, _key: &str, fallback: &str) -> String {
        fallback.to_string()
    }

    fn api_client(&self) -> Option<Arc<dyn RemarksApi>> {
        None
    }

    fn persons_api_url(&self) -> Option<String> {
        None
    }

    fn agent_name(&self) -> Option<String> {
        None
    }

    fn show_toast(&self, _message: &str, _kind: ToastKind) {}

    fn select_customer(&self, _customer_id: u64) -> BoxFuture<'static, ()> {
        Box::pin(future::ready(()))
    }

    fn push_contact_history(
        &self,
        _customer: &Customer,
        _entry: ContactHistoryEntry,
        _options: ContactHistoryOptions,
    ) {
    }

    fn save_customers(&self) {}
}

#[derive(Clone)]
pub struct DeliveryRemarksSlice {
    dependencies: Arc<DependencySlot<dyn DeliveryRemarksDependencies>>,
    scope: WeakScope,
}

impl DeliveryRemarksSlice {
    pub fn new(scope: &GlobalScope) -> Self {
        Self {
            dependencies: Arc::new(DependencySlot::new("delivery-remarks")),
            scope: scope.downgrade(),
        }
    }

    pub fn configure_dependencies(
        &self,
        resolver: Option<DependencyResolver<dyn DeliveryRemarksDependencies>>,
    ) {
        self.dependencies.configure(resolver);
    }

    pub fn dependencies(&self) -> &DependencySlot<dyn DeliveryRemarksDependencies> {
        &self.dependencies
    }

    fn document(&self) -> Option<Document> {
        self.scope.upgrade()?.document()
    }

    fn element(&self, element_id: &str) -> Option<(Document, NodeId)> {
        let document = self.document()?;
        let node = document.get_element_by_id(element_id)?;
        Some((document, node))
    }

    fn agent_name(&self, dependencies: &dyn DeliveryRemarksDependencies) -> String {
        dependencies
            .agent_name()
            .or_else(|| {
                self.element(AGENT_NAME_ID)
                    .and_then(|(document, node)| document.text(node))
            })
            .unwrap_or_default()
    }

    /// Opens the editor filled with the current customer's remarks.
    pub fn edit_delivery_remarks(&self) {
        let Some(customer) = self
            .dependencies
            .resolve()
            .and_then(|dependencies| dependencies.current_customer())
        else {
            return;
        };
        let Some(document) = self.document() else {
            return;
        };
        let (Some(modal), Some(name), Some(field)) = (
            document.get_element_by_id(MODAL_ID),
            document.get_element_by_id(CUSTOMER_NAME_ID),
            document.get_element_by_id(REMARKS_FIELD_ID),
        ) else {
            return;
        };

        let (display_name, remarks) = {
            let customer = customer.lock();
            (
                customer.display_name(),
                customer.delivery_remarks.default.clone(),
            )
        };
        document.set_text(name, display_name);
        document.set_value(field, remarks);
        document.set_attribute(modal, "style", "display: flex");
    }

    /// Appends `remark` as a new line of the open editor.
    pub fn add_delivery_remark_to_modal(&self, remark: &str) {
        if remark.is_empty() {
            return;
        }
        let Some((document, field)) = self.element(REMARKS_FIELD_ID) else {
            return;
        };
        let Some(current) = document.value(field) else {
            return;
        };

        let current = current.trim();
        let updated = if current.is_empty() {
            remark.to_string()
        } else {
            format!("{current}\n{remark}")
        };
        document.set_value(field, updated);
    }

    pub fn add_delivery_remark_to_modal_by_key(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        let remark = match self.dependencies.resolve() {
            Some(dependencies) => dependencies.translate(key, key),
            None => key.to_string(),
        };
        self.add_delivery_remark_to_modal(&remark);
    }

    pub fn close_edit_remarks_modal(&self) {
        if let Some((document, modal)) = self.element(MODAL_ID) {
            document.set_attribute(modal, "style", "display: none");
        }
    }

    /// Saves the editor contents through the backend when an API client is
    /// available, otherwise on the local customer record.
    pub async fn save_delivery_remarks(&self) {
        let Some(dependencies) = self.dependencies.resolve() else {
            return;
        };
        let Some(customer) = dependencies.current_customer() else {
            return;
        };
        let Some(raw) = self
            .element(REMARKS_FIELD_ID)
            .and_then(|(document, field)| document.value(field))
        else {
            return;
        };

        let new_remarks = raw.trim().to_string();
        if self
            .save_via_api(dependencies.as_ref(), &customer, &new_remarks)
            .await
        {
            return;
        }
        self.save_locally(dependencies.as_ref(), &customer, &new_remarks);
    }

    /// Runs [`Self::save_delivery_remarks`] on the current runtime.
    pub fn spawn_save(&self) -> Option<JoinHandle<()>> {
        let slice = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(async move { slice.save_delivery_remarks().await })),
            Err(_) => {
                warn!("delivery remarks: no async runtime, save skipped");
                None
            }
        }
    }

    async fn save_via_api(
        &self,
        dependencies: &dyn DeliveryRemarksDependencies,
        customer: &SharedCustomer,
        new_remarks: &str,
    ) -> bool {
        let Some(api) = dependencies.api_client() else {
            return false;
        };

        let customer_id = customer.lock().id;
        let base = dependencies
            .persons_api_url()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_PERSONS_API_URL.to_string());
        let url = format!("{base}/{customer_id}/delivery-remarks");
        let body = json!({
            "default": new_remarks,
            "updatedBy": self.agent_name(dependencies),
        });

        match api.put(&url, body).await {
            Ok(response) => {
                let returned = response
                    .get("deliveryRemarks")
                    .cloned()
                    .and_then(|remarks| serde_json::from_value::<DeliveryRemarks>(remarks).ok());
                if let Some(remarks) = returned {
                    customer.lock().delivery_remarks = remarks;
                }
                self.close_edit_remarks_modal();
                dependencies.show_toast(
                    &dependencies.translate(REMARKS_SAVED_KEY, REMARKS_SAVED_FALLBACK),
                    ToastKind::Success,
                );
                dependencies.select_customer(customer_id).await;
            }
            Err(error) => {
                warn!(customer_id, error = %error, "delivery remarks: backend save failed");
                let message = error.to_string();
                let message = if message.is_empty() {
                    dependencies.translate(SAVE_FAILED_KEY, SAVE_FAILED_FALLBACK)
                } else {
                    message
                };
                dependencies.show_toast(&message, ToastKind::Error);
            }
        }
        true
    }

    fn save_locally(
        &self,
        dependencies: &dyn DeliveryRemarksDependencies,
        customer: &SharedCustomer,
        new_remarks: &str,
    ) {
        let now = Utc::now();
        let updated_by = self.agent_name(dependencies);

        let changed = {
            let mut customer = customer.lock();
            let changed = customer.delivery_remarks.default != new_remarks;
            if changed {
                customer.delivery_remarks.history.insert(
                    0,
                    RemarkRevision {
                        date: now,
                        remark: new_remarks.to_string(),
                        updated_by,
                    },
                );
            }
            changed.then(|| customer.clone())
        };

        if let Some(snapshot) = changed {
            let shown = if new_remarks.is_empty() {
                EMPTY_REMARK_LABEL
            } else {
                new_remarks
            };
            dependencies.push_contact_history(
                &snapshot,
                ContactHistoryEntry {
                    kind: HISTORY_ENTRY_TYPE.to_string(),
                    description: format!("Bezorgvoorkeuren bijgewerkt: \"{shown}\""),
                },
                ContactHistoryOptions {
                    highlight: true,
                    persist: false,
                },
            );
        }

        {
            let mut customer = customer.lock();
            customer.delivery_remarks.default = new_remarks.to_string();
            customer.delivery_remarks.last_updated = Some(now);
        }

        dependencies.save_customers();
        self.close_edit_remarks_modal();
        dependencies.show_toast(
            &dependencies.translate(REMARKS_SAVED_KEY, REMARKS_SAVED_FALLBACK),
            ToastKind::Success,
        );
    }

    /// Publishes the slice operations for legacy callers.
    pub fn expose_api(&self) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };

        let edit = self.clone();
        let add = self.clone();
        let add_by_key = self.clone();
        let save = self.clone();
        let close = self.clone();
        let table = FunctionTable::new()
            .with("editDeliveryRemarks", move |_args: &[Value]| {
                edit.edit_delivery_remarks();
                CallOutcome::Completed
            })
            .with("addDeliveryRemarkToModal", move |args: &[Value]| {
                add.add_delivery_remark_to_modal(first_text(args));
                CallOutcome::Completed
            })
            .with("addDeliveryRemarkToModalByKey", move |args: &[Value]| {
                add_by_key.add_delivery_remark_to_modal_by_key(first_text(args));
                CallOutcome::Completed
            })
            .with("saveDeliveryRemarks", move |_args: &[Value]| {
                let slice = save.clone();
                CallOutcome::pending(async move {
                    slice.save_delivery_remarks().await;
                    Ok(())
                })
            })
            .with("closeEditRemarksModal", move |_args: &[Value]| {
                close.close_edit_remarks_modal();
                CallOutcome::Completed
            });
        scope.set_namespace(DELIVERY_REMARKS_SLICE_NAMESPACE, Arc::new(table));
        debug!(
            namespace = DELIVERY_REMARKS_SLICE_NAMESPACE,
            "delivery remarks: api exposed"
        );
    }
}

fn first_text(args: &[Value]) -> &str {
    args.first().and_then(Value::as_str).unwrap_or_default()
}

pub fn register(router: &ActionRouter, slice: &DeliveryRemarksSlice) {
    slice.expose_api();

    let edit = slice.clone();
    router.register("edit-delivery-remarks", move |_payload, _context| {
        edit.edit_delivery_remarks();
    });

    let add = slice.clone();
    router.register("add-delivery-remark-modal", move |payload, _context| {
        if let Some(key) = present_text(&payload, "remarkKey") {
            add.add_delivery_remark_to_modal_by_key(&key);
        }
    });

    let close = slice.clone();
    router.register("close-edit-delivery-remarks-modal", move |_payload, _context| {
        close.close_edit_remarks_modal();
    });

    let save = slice.clone();
    router.register("save-delivery-remarks", move |_payload, _context| {
        save.spawn_save();
    });
}

#[cfg(test)]
#[path = "../tests/delivery_remarks_tests.rs"]
mod tests;
