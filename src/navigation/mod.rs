//! Navigation handling for redirector.
//!
//! This module handles:
//! - The navigation events a host reports for its tabs
//! - The redirector service that owns the active configuration snapshot

pub mod redirector;

pub use redirector::{NOTIFICATION_MESSAGE, NOTIFICATION_TITLE, Redirector};

use serde::{Deserialize, Serialize};

/// Loading state of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationStatus {
	Loading,
	Complete,
}

/// A tab changed its loading state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
	pub tab_id: u32,

	pub status: NavigationStatus,

	/// The URL being loaded. May be empty on completion.
	#[serde(default)]
	pub url: String,
}
