use std::sync::Arc;

use action_router::{ActionRouter, RouterOptions, SharedContext};
use dependency_bridge::legacy_provider_resolver;
use host::{ActionHost, Document, GlobalScope};
use legacy_runtime::{
    AdapterOptions, CallAgentRuntimeClient, LegacyAppLoader, LegacyRuntimeAdapter, ScriptLoader,
    ScriptRequest, SharedState, SubscriptionRoleRuntimeClient,
};
use shared::error::ScriptLoadError;
use tracing::{debug, error, info};

use crate::{
    config::{Settings, SettingsError},
    slices::{
        self,
        delivery_remarks::{DeliveryRemarksSlice, DELIVERY_REMARKS_PROVIDER_KEY},
    },
};

pub struct Workspace {
    settings: Settings,
    scope: GlobalScope,
    state: SharedState,
    router: ActionRouter,
    legacy_loader: LegacyAppLoader,
    delivery_remarks: DeliveryRemarksSlice,
}

impl Workspace {
    pub fn compose(
        settings: Settings,
        scope: GlobalScope,
        state: SharedState,
    ) -> Result<Self, SettingsError> {
        let script_url = settings.legacy_script_url()?;
        let document = scope.document();

        let router = ActionRouter::new(router_options(&settings, document.as_ref(), &state));
        let adapter_options = AdapterOptions::default().with_log_prefix(settings.log_prefix.clone());

        let delivery_remarks = DeliveryRemarksSlice::new(&scope);
        delivery_remarks.configure_dependencies(Some(legacy_provider_resolver(
            scope.clone(),
            DELIVERY_REMARKS_PROVIDER_KEY,
        )));

        // Later registrations win, so the migrated delivery-remarks handlers
        // replace the order slice's legacy forwarding.
        slices::order::register(
            &router,
            LegacyRuntimeAdapter::globals_only(scope.clone(), adapter_options.clone()),
        );
        slices::delivery_remarks::register(&router, &delivery_remarks);
        slices::register_call_agent_slices(
            &router,
            &CallAgentRuntimeClient::with_namespace(
                scope.clone(),
                settings.call_agent_namespace.clone(),
                adapter_options.clone(),
            ),
        );
        slices::subscription_role::register(
            &router,
            SubscriptionRoleRuntimeClient::with_namespace(
                scope.clone(),
                settings.subscription_role_namespace.clone(),
                adapter_options,
            ),
        );

        let installed = router.install();
        state.set_registered_actions(router.registered_actions());
        state.mark_router_initialized();
        info!(
            installed,
            actions = router.registered_actions().len(),
            "workspace: router ready"
        );

        let legacy_loader = LegacyAppLoader::new(
            state.clone(),
            ScriptLoader::new(document),
            scope.clone(),
            ScriptRequest::new(settings.legacy_script_id.clone(), script_url),
        );

        Ok(Self {
            settings,
            scope,
            state,
            router,
            legacy_loader,
            delivery_remarks,
        })
    }

    /// Loads the legacy bundle. Failures are logged and returned; the workspace
    /// keeps running with migrated slices only.
    pub async fn bootstrap_legacy(&self) -> Result<(), ScriptLoadError> {
        let result = self.legacy_loader.ensure_loaded().await;
        match &result {
            Ok(()) => info!(
                url = %self.legacy_loader.request().url,
                "workspace: legacy bundle loaded"
            ),
            Err(err) => error!(error = %err, "workspace: failed to load legacy bundle"),
        }
        result
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scope(&self) -> &GlobalScope {
        &self.scope
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn router(&self) -> &ActionRouter {
        &self.router
    }

    pub fn legacy_loader(&self) -> &LegacyAppLoader {
        &self.legacy_loader
    }

    pub fn delivery_remarks(&self) -> &DeliveryRemarksSlice {
        &self.delivery_remarks
    }

    pub fn shutdown(&self) {
        self.router.uninstall();
        debug!("workspace: router uninstalled");
    }
}

fn router_options(
    settings: &Settings,
    document: Option<&Document>,
    state: &SharedState,
) -> RouterOptions {
    let prefix = settings.log_prefix.clone();
    let mut options = RouterOptions::default()
        .with_event_types(settings.event_types.iter().cloned())
        .with_context(SharedContext::new().with(Arc::new(state.clone())))
        .with_on_unhandled(move |action_name, unhandled| {
            debug!(
                element = unhandled.element.0,
                "{prefix} Unhandled action \"{action_name}\""
            );
        });
    if let Some(document) = document {
        options = options.with_host(Arc::new(document.clone()) as Arc<dyn ActionHost>);
    }
    options
}

#[cfg(test)]
#[path = "tests/composition_tests.rs"]
mod tests;
