use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use shared::error::ScriptLoadError;

/// A load every interested caller can await; all of them observe the same
/// outcome.
pub type LoadTask = Shared<BoxFuture<'static, Result<(), ScriptLoadError>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedStateSnapshot {
    pub router_initialized: bool,
    pub registered_actions: Vec<String>,
    pub legacy_script_loaded: bool,
    pub legacy_load_in_flight: bool,
}

#[derive(Default)]
struct StateInner {
    router_initialized: bool,
    registered_actions: Vec<String>,
    legacy_script_loaded: bool,
    legacy_load_task: Option<LoadTask>,
}

/// Process-wide bookkeeping for the migrated workspace. One instance is created
/// by the composition root and handed to everything that needs it.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<StateInner>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SharedStateSnapshot {
        let inner = self.inner.lock();
        SharedStateSnapshot {
            router_initialized: inner.router_initialized,
            registered_actions: inner.registered_actions.clone(),
            legacy_script_loaded: inner.legacy_script_loaded,
            legacy_load_in_flight: inner.legacy_load_task.is_some() && !inner.legacy_script_loaded,
        }
    }

    pub fn mark_router_initialized(&self) {
        self.inner.lock().router_initialized = true;
    }

    pub fn is_router_initialized(&self) -> bool {
        self.inner.lock().router_initialized
    }

    pub fn set_registered_actions(&self, actions: Vec<String>) {
        self.inner.lock().registered_actions = actions;
    }

    pub fn registered_actions(&self) -> Vec<String> {
        self.inner.lock().registered_actions.clone()
    }

    pub fn mark_legacy_script_loaded(&self) {
        self.inner.lock().legacy_script_loaded = true;
    }

    pub fn is_legacy_script_loaded(&self) -> bool {
        self.inner.lock().legacy_script_loaded
    }

    pub fn set_legacy_load_task(&self, task: Option<LoadTask>) {
        self.inner.lock().legacy_load_task = task;
    }

    pub fn legacy_load_task(&self) -> Option<LoadTask> {
        self.inner.lock().legacy_load_task.clone()
    }

    /// Returns the load to await: already done, already running, or started by
    /// `start` under the state lock so concurrent callers share one load.
    pub fn join_or_start_legacy_load<F>(&self, start: F) -> Option<LoadTask>
    where
        F: FnOnce() -> LoadTask,
    {
        let mut inner = self.inner.lock();
        if inner.legacy_script_loaded {
            return None;
        }
        if let Some(task) = &inner.legacy_load_task {
            return Some(task.clone());
        }
        let task = start();
        inner.legacy_load_task = Some(task.clone());
        Some(task)
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn reset_for_tests(&self) {
        *self.inner.lock() = StateInner::default();
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
