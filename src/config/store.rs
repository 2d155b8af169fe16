use crate::config::defaults::{default_config, default_settings};
use crate::config::parser::{
	export_config, has_unassigned_ids, import_config, parse_settings_file,
};
use crate::config::types::{Config, Settings};
use crate::error::{RedirectorError, Result};
use crate::events::Message;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Durable key-value storage for the settings document.
pub trait Storage {
	/// Read the stored settings, if any.
	fn load(&self) -> Result<Option<Settings>>;

	/// Replace the stored settings wholesale.
	fn save(&mut self, settings: &Settings) -> Result<()>;

	/// Remove everything.
	fn clear(&mut self) -> Result<()>;

	/// Whether [`Storage::load`] generates rule ids that are not stored yet.
	fn has_unassigned_ids(&self) -> Result<bool> {
		Ok(false)
	}
}

/// Settings persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
	path: PathBuf,
}

impl FileStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		FileStorage { path: path.into() }
	}

	/// Storage at [`default_settings_path`].
	pub fn at_default_location() -> Result<Self> {
		Ok(FileStorage::new(default_settings_path()?))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write_error(&self, source: std::io::Error) -> RedirectorError {
		RedirectorError::StorageWrite {
			path: self.path.clone(),
			source,
		}
	}
}

impl Storage for FileStorage {
	fn load(&self) -> Result<Option<Settings>> {
		if !self.path.exists() {
			return Ok(None);
		}
		parse_settings_file(&self.path).map(Some)
	}

	fn save(&mut self, settings: &Settings) -> Result<()> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
		}

		let content = serde_json::to_string_pretty(settings)
			.map_err(|source| RedirectorError::Serialize { source })?;

		// Write next to the target and rename so readers never see a partial file.
		let tmp = self.path.with_extension("json.tmp");
		std::fs::write(&tmp, content).map_err(|e| self.write_error(e))?;
		std::fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;
		Ok(())
	}

	fn clear(&mut self) -> Result<()> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(self.write_error(e)),
		}
	}

	fn has_unassigned_ids(&self) -> Result<bool> {
		if !self.path.exists() {
			return Ok(false);
		}

		let content =
			std::fs::read_to_string(&self.path).map_err(|source| RedirectorError::StorageRead {
				path: self.path.clone(),
				source,
			})?;
		let document: serde_json::Value =
			serde_json::from_str(&content).map_err(|source| RedirectorError::StorageParse {
				path: self.path.clone(),
				source,
			})?;
		Ok(has_unassigned_ids(&document))
	}
}

/// In-process storage, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
	settings: Option<Settings>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(settings: Settings) -> Self {
		MemoryStorage {
			settings: Some(settings),
		}
	}
}

impl Storage for MemoryStorage {
	fn load(&self) -> Result<Option<Settings>> {
		Ok(self.settings.clone())
	}

	fn save(&mut self, settings: &Settings) -> Result<()> {
		self.settings = Some(settings.clone());
		Ok(())
	}

	fn clear(&mut self) -> Result<()> {
		self.settings = None;
		Ok(())
	}
}

/// Get the default settings file path: `<config dir>/redirector/settings.json`.
pub fn default_settings_path() -> Result<PathBuf> {
	let config_dir = dirs::config_dir().ok_or(RedirectorError::ConfigDirectoryNotFound)?;
	Ok(config_dir.join("redirector").join("settings.json"))
}

/// Why [`ConfigStore::install`] is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
	/// First run: write the defaults.
	Install,

	/// New version over existing settings: repair them in place.
	Update,
}

/// Configuration persistence with wholesale replace-on-save semantics.
///
/// Every mutating operation returns the message that should be broadcast so
/// other surfaces converge on the new state.
#[derive(Debug)]
pub struct ConfigStore<S: Storage> {
	storage: S,
}

impl<S: Storage> ConfigStore<S> {
	pub fn new(storage: S) -> Self {
		ConfigStore { storage }
	}

	pub fn storage(&self) -> &S {
		&self.storage
	}

	/// The stored configuration, or the defaults when nothing is stored.
	pub fn load(&self) -> Result<Config> {
		Ok(self
			.storage
			.load()?
			.map(|settings| settings.options)
			.unwrap_or_else(default_config))
	}

	/// Load the configuration for handing out rule ids.
	///
	/// Ids are only stable once stored, so this first writes the defaults when
	/// nothing is stored, and writes back ids generated for stored rules.
	pub fn load_persisted(&mut self) -> Result<Config> {
		let Some(settings) = self.storage.load()? else {
			return self.install(InstallReason::Install);
		};

		if self.storage.has_unassigned_ids()? {
			self.write(&settings.options)?;
			info!("stored generated rule ids");
		}
		Ok(settings.options)
	}

	/// Whether any settings have been persisted.
	pub fn is_initialized(&self) -> Result<bool> {
		Ok(self.storage.load()?.is_some())
	}

	/// Persist `config`, silently dropping rules with a blank `src` or `dest`.
	pub fn save(&mut self, mut config: Config) -> Result<(Config, Message)> {
		let dropped = config.rules.retain_valid();
		if dropped > 0 {
			debug!(dropped, "dropped incomplete rules before saving");
		}

		self.write(&config)?;
		info!(rules = config.rules.len(), "configuration saved");
		let msg = Message::SyncOptions {
			options: config.clone(),
		};
		Ok((config, msg))
	}

	/// Restore the defaults.
	pub fn reset(&mut self) -> Result<(Config, Message)> {
		let config = default_config();
		self.write(&config)?;
		info!("configuration reset to defaults");
		Ok((config, Message::ReloadOptions))
	}

	/// Remove every rule, keeping the flags.
	pub fn clear_rules(&mut self) -> Result<(Config, Message)> {
		let mut config = self.load()?;
		config.rules = Default::default();
		self.save(config)
	}

	/// Prepare storage on install or update.
	pub fn install(&mut self, reason: InstallReason) -> Result<Config> {
		let existing = match reason {
			InstallReason::Install => None,
			InstallReason::Update => self.storage.load()?,
		};

		let Some(settings) = existing else {
			let settings = default_settings();
			self.storage.save(&settings)?;
			info!(?reason, "wrote default configuration");
			return Ok(settings.options);
		};

		// Ids were already filled in while deserializing.
		let mut config = settings.options;
		let removed = config.rules.dedup_targets();
		self.write(&config)?;
		info!(?reason, removed, "repaired stored configuration");
		Ok(config)
	}

	/// Validate and persist an exported configuration document.
	///
	/// Nothing is written unless the whole document is valid.
	pub fn import(&mut self, content: &str) -> Result<(Config, Message)> {
		let config = import_config(content)?;
		self.save(config)
	}

	/// Export the current configuration as pretty-printed JSON.
	pub fn export(&self) -> Result<String> {
		export_config(&self.load()?)
	}

	fn write(&mut self, config: &Config) -> Result<()> {
		self.storage.save(&Settings {
			options: config.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::Rule;

	fn store() -> ConfigStore<MemoryStorage> {
		ConfigStore::new(MemoryStorage::new())
	}

	#[test]
	fn test_load_falls_back_to_defaults() {
		let store = store();
		assert!(!store.is_initialized().unwrap());
		assert_eq!(store.load().unwrap().rules.len(), 4);
	}

	#[test]
	fn test_save_drops_blank_rules_and_broadcasts() {
		let mut store = store();
		let config = Config {
			rules: vec![Rule::exact("a", "b"), Rule::exact("", "c"), Rule::exact("d", " ")].into(),
			..Default::default()
		};

		let (saved, msg) = store.save(config).unwrap();
		assert_eq!(saved.rules.len(), 1);
		assert_eq!(store.load().unwrap(), saved);
		assert_eq!(msg, Message::SyncOptions { options: saved });
	}

	#[test]
	fn test_reset_restores_defaults() {
		let mut store = store();
		store.save(Config::default()).unwrap();
		assert!(store.load().unwrap().rules.is_empty());

		let (config, msg) = store.reset().unwrap();
		assert_eq!(msg, Message::ReloadOptions);
		assert_eq!(config.rules.len(), 4);
		assert_eq!(store.load().unwrap(), config);
	}

	#[test]
	fn test_clear_rules_keeps_flags() {
		let mut store = store();
		let config = Config {
			open_new_tab: true,
			notify_event: true,
			rules: vec![Rule::exact("a", "b")].into(),
			..Default::default()
		};
		store.save(config).unwrap();

		let (cleared, _) = store.clear_rules().unwrap();
		assert!(cleared.rules.is_empty());
		assert!(cleared.open_new_tab);
		assert!(cleared.notify_event);
	}

	#[test]
	fn test_install_writes_defaults() {
		let mut store = store();
		let config = store.install(InstallReason::Install).unwrap();
		assert_eq!(config.rules.len(), 4);
		assert!(store.is_initialized().unwrap());
	}

	#[test]
	fn test_update_without_settings_writes_defaults() {
		let mut store = store();
		let config = store.install(InstallReason::Update).unwrap();
		assert_eq!(config.rules.len(), 4);
	}

	#[test]
	fn test_update_dedups_existing_rules() {
		let mut store = store();
		let config = Config {
			rules: vec![
				Rule::exact("a", "b"),
				Rule::exact("c", "d"),
				Rule::exact("a", "b"),
			]
			.into(),
			..Default::default()
		};
		store.save(config).unwrap();

		let repaired = store.install(InstallReason::Update).unwrap();
		assert_eq!(repaired.rules.len(), 2);
		assert_eq!(store.load().unwrap(), repaired);
	}

	#[test]
	fn test_rejected_import_leaves_storage_untouched() {
		let mut store = store();
		let (before, _) = store.save(Config::default()).unwrap();

		let result = store.import(r#"{"enabled": true}"#);
		assert!(matches!(result, Err(RedirectorError::InvalidImport { .. })));
		assert_eq!(store.load().unwrap(), before);
	}

	#[test]
	fn test_export_import_round_trip_through_store() {
		let mut store = store();
		store.install(InstallReason::Install).unwrap();
		let exported = store.export().unwrap();

		let mut other = ConfigStore::new(MemoryStorage::new());
		let (imported, _) = other.import(&exported).unwrap();
		let original = store.load().unwrap();
		assert_eq!(imported.rules.len(), original.rules.len());
		assert_eq!(imported.enabled, original.enabled);
	}

	#[test]
	fn test_file_storage_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("settings.json");
		let mut storage = FileStorage::new(&path);
		assert!(storage.load().unwrap().is_none());

		let settings = default_settings();
		storage.save(&settings).unwrap();
		assert!(path.exists());
		assert_eq!(storage.load().unwrap(), Some(settings));

		storage.clear().unwrap();
		assert!(!path.exists());
		storage.clear().unwrap();
	}

	#[test]
	fn test_load_persisted_writes_defaults_once() {
		let mut store = store();
		let first = store.load_persisted().unwrap();
		assert!(store.is_initialized().unwrap());
		assert_eq!(store.load_persisted().unwrap(), first);
		assert_eq!(store.load().unwrap(), first);
	}

	#[test]
	fn test_load_persisted_stores_generated_ids() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		std::fs::write(
			&path,
			r#"{"options": {"rules": [
				{"id": null, "src": "a", "dest": "b", "enabled": true, "regex": false},
				{"src": "c", "dest": "d", "enabled": true, "regex": false}
			]}}"#,
		)
		.unwrap();

		let mut store = ConfigStore::new(FileStorage::new(&path));
		assert!(store.storage().has_unassigned_ids().unwrap());

		let config = store.load_persisted().unwrap();
		assert!(!store.storage().has_unassigned_ids().unwrap());
		assert_eq!(store.load().unwrap(), config);
		assert_eq!(store.load_persisted().unwrap(), config);
	}

	#[test]
	fn test_default_settings_path() {
		match default_settings_path() {
			Ok(path) => assert!(path.ends_with("redirector/settings.json")),
			Err(e) => assert!(matches!(e, RedirectorError::ConfigDirectoryNotFound)),
		}
	}
}
