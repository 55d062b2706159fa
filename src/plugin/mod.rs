pub mod error;
pub mod installer;
pub mod manager;
pub mod manifest;
pub mod metadata;
pub mod registry;
pub mod store;
#[cfg(test)]
pub mod testing;

pub use manager::PluginManager;
