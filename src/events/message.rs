use crate::config::types::Config;
use serde::{Deserialize, Serialize};

/// Change notifications exchanged between independently running surfaces.
///
/// Serialized as `{"type": "syncOptions", "options": {...}}`,
/// `{"type": "resetRules"}` and `{"type": "reloadOptions"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
	/// A configuration was saved; receivers adopt it wholesale.
	SyncOptions { options: Config },

	/// Ask the owner of storage to restore the defaults.
	ResetRules,

	/// Storage changed underneath; receivers re-read it.
	ReloadOptions,
}
