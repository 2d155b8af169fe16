use crate::config::types::{Config, Rule, Settings};

/// Configuration written on first install and on reset.
///
/// Every call yields fresh rule ids.
pub fn default_config() -> Config {
	Config {
		enabled: true,
		open_new_tab: false,
		notify_event: false,
		rules: vec![
			Rule::regex(
				"^https?://(?!localhost|bar.test)([^/]+)(.*)$",
				"https://localhost/",
			)
			.with_enabled(false),
			Rule::regex(
				"^https?://(?!localhost|foo.test)([^/]+)(.*)$",
				"http://localhost/",
			)
			.with_enabled(false),
			Rule::exact("https://example.com/", "https://example.org/"),
			Rule::regex("https?://example.org/", "https://google.com/").with_enabled(false),
		]
		.into(),
	}
}

pub fn default_settings() -> Settings {
	Settings {
		options: default_config(),
	}
}
