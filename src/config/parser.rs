use crate::config::types::{Config, Rule, RuleId, Settings};
use crate::error::{RedirectorError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Parse a settings file from the given path.
pub fn parse_settings_file(path: &Path) -> Result<Settings> {
	let content = std::fs::read_to_string(path).map_err(|source| RedirectorError::StorageRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_settings_str(&content, path)
}

/// Parse settings from a string (useful for testing).
///
/// Stored settings are read leniently: missing flags take their defaults and
/// rules without an id receive one.
pub fn parse_settings_str(content: &str, path: &Path) -> Result<Settings> {
	serde_json::from_str(content).map_err(|source| RedirectorError::StorageParse {
		path: path.to_path_buf(),
		source,
	})
}

/// Whether a stored settings document has rules that only get an id while
/// being parsed: the id is missing, `null`, blank, or repeats an earlier one.
pub fn has_unassigned_ids(document: &Value) -> bool {
	let Some(rules) = document.pointer("/options/rules").and_then(Value::as_array) else {
		return false;
	};

	let mut seen = HashSet::new();
	rules.iter().any(|rule| {
		match rule.get("id").and_then(Value::as_str) {
			Some(id) if !id.trim().is_empty() => !seen.insert(id),
			_ => true,
		}
	})
}

/// Serialize a configuration for export.
pub fn export_config(config: &Config) -> Result<String> {
	serde_json::to_string_pretty(config).map_err(|source| RedirectorError::Serialize { source })
}

/// Parse and strictly validate an exported configuration.
///
/// Every flag and every rule field must be present with the right type, and
/// `src`/`dest` must be non-blank. Any violation rejects the whole document.
/// Accepted rules get fresh ids.
pub fn import_config(content: &str) -> Result<Config> {
	let value: Value =
		serde_json::from_str(content).map_err(|source| RedirectorError::ImportParse { source })?;
	validate_import(&value)
}

/// Validate an already-parsed import document.
pub fn validate_import(value: &Value) -> Result<Config> {
	let object = value
		.as_object()
		.ok_or_else(|| invalid("configuration must be a JSON object"))?;

	let enabled = require_bool(object, "enabled", "configuration")?;
	let open_new_tab = require_bool(object, "openNewTab", "configuration")?;
	let notify_event = require_bool(object, "notifyEvent", "configuration")?;

	let rules = object
		.get("rules")
		.and_then(Value::as_array)
		.ok_or_else(|| invalid("`rules` must be an array"))?;

	let rules = rules
		.iter()
		.enumerate()
		.map(|(index, rule)| validate_rule(index, rule))
		.collect::<Result<Vec<_>>>()?;

	Ok(Config {
		enabled,
		open_new_tab,
		notify_event,
		rules: rules.into(),
	})
}

fn validate_rule(index: usize, value: &Value) -> Result<Rule> {
	let context = format!("rule {}", index + 1);
	let object = value
		.as_object()
		.ok_or_else(|| invalid(format!("{context} must be an object")))?;

	Ok(Rule {
		id: RuleId::generate(),
		src: require_text(object, "src", &context)?,
		dest: require_text(object, "dest", &context)?,
		enabled: require_bool(object, "enabled", &context)?,
		regex: require_bool(object, "regex", &context)?,
	})
}

fn require_bool(object: &Map<String, Value>, key: &str, context: &str) -> Result<bool> {
	object
		.get(key)
		.and_then(Value::as_bool)
		.ok_or_else(|| invalid(format!("{context}: `{key}` must be a boolean")))
}

fn require_text(object: &Map<String, Value>, key: &str, context: &str) -> Result<String> {
	object
		.get(key)
		.and_then(Value::as_str)
		.filter(|s| !s.trim().is_empty())
		.map(str::to_string)
		.ok_or_else(|| invalid(format!("{context}: `{key}` must be a non-empty string")))
}

fn invalid(reason: impl Into<String>) -> RedirectorError {
	RedirectorError::InvalidImport {
		reason: reason.into(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::defaults::default_config;
	use std::path::PathBuf;

	const VALID: &str = r#"{
  "enabled": true,
  "openNewTab": false,
  "notifyEvent": true,
  "rules": [
    {"id": "keep-me-not", "src": "https://a.test/", "dest": "https://b.test/", "enabled": true, "regex": false},
    {"src": "^http://(.*)$", "dest": "https://$1", "enabled": false, "regex": true, "name": null}
  ]
}"#;

	fn expect_invalid(content: &str) -> String {
		match import_config(content).unwrap_err() {
			RedirectorError::InvalidImport { reason } => reason,
			other => panic!("Expected InvalidImport error, got {other:?}"),
		}
	}

	#[test]
	fn test_import_valid_config() {
		let config = import_config(VALID).unwrap();
		assert!(config.enabled);
		assert!(!config.open_new_tab);
		assert!(config.notify_event);
		assert_eq!(config.rules.len(), 2);

		let rules = config.rules.as_slice();
		assert_eq!(rules[0].src, "https://a.test/");
		assert_ne!(rules[0].id, RuleId::from("keep-me-not"));
		assert!(rules[1].regex);
		assert!(!rules[1].enabled);
	}

	#[test]
	fn test_export_then_import_round_trip() {
		let original = default_config();
		let exported = export_config(&original).unwrap();
		let imported = import_config(&exported).unwrap();

		assert_eq!(imported.enabled, original.enabled);
		assert_eq!(imported.open_new_tab, original.open_new_tab);
		assert_eq!(imported.notify_event, original.notify_event);
		assert_eq!(imported.rules.len(), original.rules.len());
		for (a, b) in imported.rules.iter().zip(original.rules.iter()) {
			assert_eq!(
				(&a.src, &a.dest, a.enabled, a.regex),
				(&b.src, &b.dest, b.enabled, b.regex)
			);
		}
	}

	#[test]
	fn test_export_is_pretty_printed() {
		let exported = export_config(&default_config()).unwrap();
		assert!(exported.contains("\n  \"enabled\": true"));
		assert!(exported.contains("\"openNewTab\""));
	}

	#[test]
	fn test_import_rejects_blank_src() {
		let content = r#"{"enabled": true, "openNewTab": false, "notifyEvent": false,
			"rules": [{"src": "  ", "dest": "https://b.test/", "enabled": true, "regex": false}]}"#;
		assert_eq!(expect_invalid(content), "rule 1: `src` must be a non-empty string");
	}

	#[test]
	fn test_import_rejects_missing_dest() {
		let content = r#"{"enabled": true, "openNewTab": false, "notifyEvent": false,
			"rules": [
				{"src": "a", "dest": "b", "enabled": true, "regex": false},
				{"src": "a", "enabled": true, "regex": false}
			]}"#;
		assert_eq!(expect_invalid(content), "rule 2: `dest` must be a non-empty string");
	}

	#[test]
	fn test_import_rejects_non_boolean_rule_flags() {
		let content = r#"{"enabled": true, "openNewTab": false, "notifyEvent": false,
			"rules": [{"src": "a", "dest": "b", "enabled": "yes", "regex": false}]}"#;
		assert_eq!(expect_invalid(content), "rule 1: `enabled` must be a boolean");

		let content = r#"{"enabled": true, "openNewTab": false, "notifyEvent": false,
			"rules": [{"src": "a", "dest": "b", "enabled": true, "regex": 1}]}"#;
		assert_eq!(expect_invalid(content), "rule 1: `regex` must be a boolean");
	}

	#[test]
	fn test_import_rejects_missing_flag() {
		let content = r#"{"enabled": true, "openNewTab": false, "rules": []}"#;
		assert_eq!(
			expect_invalid(content),
			"configuration: `notifyEvent` must be a boolean"
		);
	}

	#[test]
	fn test_import_rejects_rules_object() {
		let content = r#"{"enabled": true, "openNewTab": false, "notifyEvent": false, "rules": {}}"#;
		assert_eq!(expect_invalid(content), "`rules` must be an array");
	}

	#[test]
	fn test_import_rejects_non_object() {
		assert_eq!(expect_invalid("[]"), "configuration must be a JSON object");
	}

	#[test]
	fn test_import_rejects_malformed_json() {
		assert!(matches!(
			import_config("{not json"),
			Err(RedirectorError::ImportParse { .. })
		));
	}

	#[test]
	fn test_parse_settings_assigns_missing_ids() {
		let content = r#"{"options": {"enabled": false, "openNewTab": true, "notifyEvent": false,
			"rules": [{"id": null, "src": "a", "dest": "b", "enabled": true, "regex": false}]}}"#;
		let settings = parse_settings_str(content, &PathBuf::from("settings.json")).unwrap();
		assert!(!settings.options.enabled);
		assert!(settings.options.open_new_tab);
		assert!(!settings.options.rules.as_slice()[0].id.as_str().is_empty());
	}

	#[test]
	fn test_has_unassigned_ids() {
		let doc = |rules: &str| -> Value {
			serde_json::from_str(&format!(r#"{{"options": {{"rules": {rules}}}}}"#)).unwrap()
		};

		assert!(!has_unassigned_ids(&doc(r#"[{"id": "a"}, {"id": "b"}]"#)));
		assert!(has_unassigned_ids(&doc(r#"[{"id": "a"}, {"id": null}]"#)));
		assert!(has_unassigned_ids(&doc(r#"[{"src": "x"}]"#)));
		assert!(has_unassigned_ids(&doc(r#"[{"id": "  "}]"#)));
		assert!(has_unassigned_ids(&doc(r#"[{"id": "a"}, {"id": "a"}]"#)));
		assert!(!has_unassigned_ids(&serde_json::json!({"options": {}})));
	}

	#[test]
	fn test_parse_settings_reports_path() {
		let path = PathBuf::from("broken.json");
		match parse_settings_str("{", &path).unwrap_err() {
			RedirectorError::StorageParse { path: p, .. } => assert_eq!(p, path),
			_ => panic!("Expected StorageParse error"),
		}
	}
}
