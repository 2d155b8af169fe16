use crate::rules::RuleSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable, opaque identifier of a rule.
///
/// Assigned when the rule is created and kept across edits and reorders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
	/// Generate a fresh random identifier.
	pub fn generate() -> Self {
		RuleId(Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Deserialize an identifier, generating one when it is `null`, missing, or blank.
	fn deserialize_or_generate<'de, D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let id: Option<String> = Option::deserialize(deserializer)?;
		Ok(id
			.filter(|id| !id.trim().is_empty())
			.map(RuleId)
			.unwrap_or_else(RuleId::generate))
	}
}

impl fmt::Display for RuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RuleId {
	fn from(id: &str) -> Self {
		RuleId(id.to_string())
	}
}

impl From<String> for RuleId {
	fn from(id: String) -> Self {
		RuleId(id)
	}
}

/// A single source-to-destination rewrite directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
	#[serde(
		default = "RuleId::generate",
		deserialize_with = "RuleId::deserialize_or_generate"
	)]
	pub id: RuleId,

	/// Literal URL (exact mode) or regular-expression pattern (regex mode).
	pub src: String,

	/// Literal URL (exact mode) or replacement template (regex mode).
	pub dest: String,

	/// Disabled rules are never evaluated.
	pub enabled: bool,

	/// Selects regex search-and-replace instead of exact string equality.
	pub regex: bool,
}

impl Rule {
	/// Create an enabled exact-match rule with a fresh id.
	pub fn exact(src: impl Into<String>, dest: impl Into<String>) -> Self {
		Rule {
			id: RuleId::generate(),
			src: src.into(),
			dest: dest.into(),
			enabled: true,
			regex: false,
		}
	}

	/// Create an enabled regex rule with a fresh id.
	pub fn regex(src: impl Into<String>, dest: impl Into<String>) -> Self {
		Rule {
			regex: true,
			..Rule::exact(src, dest)
		}
	}

	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Whether both `src` and `dest` are non-blank.
	pub fn is_valid(&self) -> bool {
		!self.src.trim().is_empty() && !self.dest.trim().is_empty()
	}
}

/// User configuration: global flags plus the ordered rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	/// Global on/off switch for redirection.
	pub enabled: bool,

	/// Open the redirect target in a new tab instead of rewriting in place.
	pub open_new_tab: bool,

	/// Fire a notification once a redirect completes.
	pub notify_event: bool,

	/// Rules in priority order. First match wins.
	pub rules: RuleSet,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			enabled: true,
			open_new_tab: false,
			notify_event: false,
			rules: RuleSet::new(),
		}
	}
}

/// Root of the persisted settings document: `{"options": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
	pub options: Config,
}
