use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailure {
    /// The host reported an `error` event for the resource node.
    Rejected,
    /// The host went away before the resource settled.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load script '{id}' from {url} ({failure:?}): {message}")]
pub struct ScriptLoadError {
    pub id: String,
    pub url: String,
    pub failure: LoadFailure,
    pub message: String,
}

impl ScriptLoadError {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        failure: LoadFailure,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            failure,
            message: message.into(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.failure == LoadFailure::Rejected
    }
}
