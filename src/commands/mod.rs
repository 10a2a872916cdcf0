pub mod config;
pub mod inventory;
pub mod reconcile;
pub mod resources;
