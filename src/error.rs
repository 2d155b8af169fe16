use std::path::PathBuf;
use std::sync::Arc;

/// Library-level structured errors for redirector.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum RedirectorError {
	#[error("Failed to read settings file: {path}")]
	StorageRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write settings file: {path}")]
	StorageWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings file: {path}")]
	StorageParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Invalid regex pattern in rule {rule_id}: {pattern}")]
	InvalidRegex {
		rule_id: String,
		pattern: String,
		#[source]
		source: Arc<fancy_regex::Error>,
	},

	#[error("Regex evaluation failed in rule {rule_id}: {pattern}")]
	RegexRuntime {
		rule_id: String,
		pattern: String,
		#[source]
		source: Box<fancy_regex::Error>,
	},

	#[error("Invalid configuration import: {reason}")]
	InvalidImport { reason: String },

	#[error("Failed to parse imported configuration")]
	ImportParse {
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to serialize configuration")]
	Serialize {
		#[source]
		source: serde_json::Error,
	},

	#[error("Rule not found: {id}")]
	RuleNotFound { id: String },

	#[error("Position {index} is out of range for {len} rules")]
	InvalidPosition { index: usize, len: usize },

	#[error("Failed to resolve configuration directory")]
	ConfigDirectoryNotFound,
}

/// Result type alias using RedirectorError.
pub type Result<T> = std::result::Result<T, RedirectorError>;
