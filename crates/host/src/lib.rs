pub mod dom;
pub mod scope;

pub use dom::{ActionHost, Document, DomEvent, Listener, ListenerOptions, WeakDocument};
pub use scope::{
    CallOutcome, CapabilityTable, DependencyProvider, FunctionTable, GlobalScope, LegacyFunction,
    ScopeEvent, WeakScope,
};
