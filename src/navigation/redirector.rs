use crate::config::store::{ConfigStore, Storage};
use crate::config::types::Config;
use crate::error::Result;
use crate::events::{Effect, Event, Listener, Message};
use crate::navigation::{NavigationEvent, NavigationStatus};
use crate::rules::{CompiledRules, InvalidRegexPolicy};
use tracing::{debug, info};

/// Title of the notification shown after a redirect.
pub const NOTIFICATION_TITLE: &str = "Redirector";

/// Body of the notification shown after a redirect.
pub const NOTIFICATION_MESSAGE: &str = "The page was redirected";

/// Owns the configuration snapshot used to redirect navigations.
///
/// The snapshot only changes through [`Redirector::refresh`] and
/// [`Redirector::reload`], which the message handlers call, so every
/// navigation is evaluated against the latest committed configuration.
#[derive(Debug)]
pub struct Redirector<S: Storage> {
	store: ConfigStore<S>,
	config: Config,
	rules: CompiledRules,
	policy: InvalidRegexPolicy,
	last_tab_id: Option<u32>,
}

impl<S: Storage> Redirector<S> {
	/// Create a redirector with the configuration currently in `store`.
	pub fn new(mut store: ConfigStore<S>) -> Result<Self> {
		let config = store.load_persisted()?;
		let rules = CompiledRules::compile(config.rules.as_slice());
		Ok(Redirector {
			store,
			config,
			rules,
			policy: InvalidRegexPolicy::default(),
			last_tab_id: None,
		})
	}

	pub fn with_policy(mut self, policy: InvalidRegexPolicy) -> Self {
		self.policy = policy;
		self.compile();
		self
	}

	/// The active configuration snapshot.
	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn store(&self) -> &ConfigStore<S> {
		&self.store
	}

	/// Adopt `config` as the new snapshot.
	pub fn refresh(&mut self, config: Config) {
		self.config = config;
		self.compile();
		debug!(
			enabled = self.config.enabled,
			rules = self.rules.len(),
			"configuration refreshed"
		);
	}

	/// Re-read the snapshot from storage.
	pub fn reload(&mut self) -> Result<()> {
		let config = self.store.load_persisted()?;
		self.refresh(config);
		Ok(())
	}

	fn compile(&mut self) {
		self.rules = CompiledRules::compile(self.config.rules.as_slice()).with_policy(self.policy);
	}

	/// React to a tab changing its loading state.
	pub fn handle_navigation(&mut self, event: &NavigationEvent) -> Result<Vec<Effect>> {
		if !self.config.enabled {
			return Ok(vec![]);
		}

		let mut effects = Vec::new();
		match event.status {
			NavigationStatus::Loading => {
				let Some(redirect) = self.rules.find_redirect(&event.url)? else {
					return Ok(effects);
				};
				info!(tab_id = event.tab_id, from = %event.url, to = %redirect.url, "redirecting");

				if self.config.open_new_tab {
					effects.push(Effect::CreateTab { url: redirect.url });
					effects.extend(self.notification());
				} else {
					self.last_tab_id = Some(event.tab_id);
					effects.push(Effect::UpdateTab {
						tab_id: event.tab_id,
						url: redirect.url,
					});
				}
			}
			NavigationStatus::Complete => {
				if self.last_tab_id == Some(event.tab_id) {
					self.last_tab_id = None;
					effects.extend(self.notification());
				}
			}
		}

		Ok(effects)
	}

	/// React to a change notification.
	pub fn handle_message(&mut self, message: &Message) -> Result<Vec<Effect>> {
		match message {
			Message::SyncOptions { options } => {
				self.refresh(options.clone());
				Ok(vec![])
			}
			Message::ResetRules => {
				let (config, reply) = self.store.reset()?;
				self.refresh(config);
				Ok(vec![Effect::Broadcast { message: reply }])
			}
			Message::ReloadOptions => {
				self.reload()?;
				Ok(vec![])
			}
		}
	}

	fn notification(&self) -> Option<Effect> {
		self.config.notify_event.then(|| Effect::Notify {
			title: NOTIFICATION_TITLE.to_string(),
			message: NOTIFICATION_MESSAGE.to_string(),
		})
	}
}

impl<S: Storage> Listener for Redirector<S> {
	fn on_event(&mut self, event: &Event) -> Result<Vec<Effect>> {
		match event {
			Event::Navigation(navigation) => self.handle_navigation(navigation),
			Event::Message(message) => self.handle_message(message),
		}
	}
}
