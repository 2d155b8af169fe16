//! Configuration model and persistence for redirector.
//!
//! This module handles:
//! - The configuration and rule types and their JSON shape
//! - First-install defaults
//! - Strict import validation and export
//! - Durable storage with replace-on-save semantics

pub mod defaults;
pub mod parser;
pub mod store;
pub mod types;

pub use defaults::{default_config, default_settings};
pub use parser::{export_config, import_config, parse_settings_file, parse_settings_str};
pub use store::{
	ConfigStore, FileStorage, InstallReason, MemoryStorage, Storage, default_settings_path,
};
pub use types::{Config, Rule, RuleId, Settings};
