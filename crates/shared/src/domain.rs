use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(NodeId);
id_newtype!(ListenerId);

pub const CLICK: &str = "click";
pub const CHANGE: &str = "change";
pub const SUBMIT: &str = "submit";
pub const KEYDOWN: &str = "keydown";
pub const INPUT: &str = "input";
pub const LOAD: &str = "load";
pub const ERROR: &str = "error";

/// Event kinds an action router observes when none are configured.
pub const DEFAULT_ACTION_EVENTS: [&str; 4] = [CLICK, CHANGE, SUBMIT, KEYDOWN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}
