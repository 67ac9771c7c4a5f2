pub mod composition;
pub mod config;
pub mod slices;

pub use composition::Workspace;
pub use config::{load_settings, Settings, SettingsError};

#[cfg(test)]
mod test_support;
