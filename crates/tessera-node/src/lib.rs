//! # tessera-node
//!
//! Single-node runtime for the Tessera fee engine.
//!
//! ## Modules
//!
//! - [`config`] — TOML configuration (`$TESSERA_HOME/config.toml`)
//! - [`app`] — Application state: ledger, oracle, fee params, fee grants

pub mod app;
pub mod config;

pub use app::App;
pub use config::NodeConfig;
