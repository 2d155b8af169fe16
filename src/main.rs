use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use redirector_cli::config::{
	Config, ConfigStore, FileStorage, InstallReason, Rule, RuleId, default_settings_path,
};
use redirector_cli::events::{Dispatcher, Event};
use redirector_cli::navigation::Redirector;
use redirector_cli::rules::{InvalidRegexPolicy, Substitution, match_url, try_match_url};

#[derive(Parser)]
#[command(name = "redirector")]
#[command(
	author,
	version,
	about = "Redirect URLs using ordered exact and regex rewrite rules"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file to use instead of the default location
	#[arg(long, global = true, env = "REDIRECTOR_CONFIG", value_name = "PATH")]
	config: Option<PathBuf>,

	/// Increase log verbosity (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the redirect target for a URL (exit code 1 when nothing matches)
	Match {
		url: String,

		/// Fail on the first rule with an invalid regex instead of skipping it
		#[arg(long)]
		strict: bool,
	},
	/// Rule management commands
	Rules {
		#[command(subcommand)]
		action: RulesAction,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
	/// Read JSON-lines events from stdin and print the resulting effects
	Watch {
		/// Fail on the first rule with an invalid regex instead of skipping it
		#[arg(long)]
		strict: bool,
	},
}

#[derive(Subcommand)]
enum RulesAction {
	/// List rules in priority order
	List,
	/// Append a rule
	Add {
		src: String,
		dest: String,

		/// Treat SRC as a regex and DEST as a replacement template
		#[arg(long)]
		regex: bool,

		/// Add the rule disabled
		#[arg(long)]
		disabled: bool,
	},
	/// Remove a rule
	Remove { id: String },
	/// Enable a rule
	Enable { id: String },
	/// Disable a rule
	Disable { id: String },
	/// Move a rule to a 1-based position
	Move { id: String, position: usize },
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration
	Show,
	/// Print the settings file path
	Path,
	/// Write the default configuration
	Init {
		/// Repair existing settings instead of replacing them
		#[arg(long, conflicts_with = "force")]
		update: bool,

		/// Overwrite existing settings
		#[arg(long)]
		force: bool,
	},
	/// Export the configuration as JSON
	Export {
		/// Write to a file instead of stdout
		#[arg(short, long, value_name = "FILE")]
		output: Option<PathBuf>,
	},
	/// Replace the configuration with a previously exported one
	Import { file: PathBuf },
	/// Restore the default configuration
	Reset,
	/// Remove all rules
	Clear,
	/// Change global flags
	Set {
		/// Turn redirection on or off
		#[arg(long)]
		enabled: Option<bool>,

		/// Open redirects in a new tab
		#[arg(long)]
		open_new_tab: Option<bool>,

		/// Notify after a redirect completes
		#[arg(long)]
		notify: Option<bool>,
	},
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "debug",
		_ => "trace",
	};

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	let path = match cli.config {
		Some(path) => path,
		None => default_settings_path().context("Failed to determine settings path")?,
	};
	let store = ConfigStore::new(FileStorage::new(&path));

	match cli.command {
		Commands::Match { url, strict } => handle_match(&store, &url, strict),
		Commands::Rules { action } => handle_rules(store, action),
		Commands::Config { action } => handle_config(store, &path, action),
		Commands::Watch { strict } => handle_watch(store, strict),
	}
}

fn handle_match(store: &ConfigStore<FileStorage>, url: &str, strict: bool) -> Result<ExitCode> {
	let config = store.load().context("Failed to load configuration")?;
	let rules = config.rules.as_slice();

	let result = if strict {
		try_match_url(rules, url).context("Failed to evaluate rules")?
	} else {
		match_url(rules, url)
	};

	match result {
		Some(target) => {
			println!("{}", target);
			Ok(ExitCode::SUCCESS)
		}
		None => {
			eprintln!("No rule matched {}", url);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_rules(mut store: ConfigStore<FileStorage>, action: RulesAction) -> Result<ExitCode> {
	let mut config = store
		.load_persisted()
		.context("Failed to load configuration")?;

	match action {
		RulesAction::List => {
			print_rules(&config);
			return Ok(ExitCode::SUCCESS);
		}
		RulesAction::Add {
			src,
			dest,
			regex,
			disabled,
		} => {
			if src.trim().is_empty() || dest.trim().is_empty() {
				anyhow::bail!("Source and destination must not be empty");
			}
			if regex && let Err(e) = Substitution::new(&src, &dest) {
				eprintln!("Warning: pattern does not compile and will be skipped: {}", e);
			}

			let rule = if regex {
				Rule::regex(src, dest)
			} else {
				Rule::exact(src, dest)
			};
			let id = config.rules.push(rule.with_enabled(!disabled));
			println!("Added rule {}", id);
		}
		RulesAction::Remove { id } => {
			let removed = config.rules.remove(&RuleId::from(id))?;
			println!("Removed rule {}", removed.id);
		}
		RulesAction::Enable { id } => {
			config.rules.set_enabled(&RuleId::from(id), true)?;
		}
		RulesAction::Disable { id } => {
			config.rules.set_enabled(&RuleId::from(id), false)?;
		}
		RulesAction::Move { id, position } => {
			let index = position
				.checked_sub(1)
				.context("Positions start at 1")?;
			config.rules.move_to(&RuleId::from(id), index)?;
		}
	}

	store.save(config).context("Failed to save configuration")?;
	Ok(ExitCode::SUCCESS)
}

fn print_rules(config: &Config) {
	if config.rules.is_empty() {
		println!("No rules configured.");
		return;
	}

	for (i, rule) in config.rules.iter().enumerate() {
		println!(
			"{}. [{}] {} {} -> {}",
			i + 1,
			if rule.enabled { "on" } else { "off" },
			if rule.regex { "regex" } else { "exact" },
			rule.src,
			rule.dest
		);
		println!("   id: {}", rule.id);
	}
}

fn handle_config(
	mut store: ConfigStore<FileStorage>,
	path: &Path,
	action: ConfigAction,
) -> Result<ExitCode> {
	match action {
		ConfigAction::Show => {
			let config = store.load().context("Failed to load configuration")?;
			if store.is_initialized()? {
				println!("# Source: {}", path.display());
			} else {
				println!("# Source: built-in defaults ({} not found)", path.display());
			}
			println!("# enabled: {}", config.enabled);
			println!("# open-new-tab: {}", config.open_new_tab);
			println!("# notify-event: {}", config.notify_event);
			println!("# rules: {}", config.rules.len());
			println!();
			print_rules(&config);
		}
		ConfigAction::Path => {
			println!("{}", path.display());
		}
		ConfigAction::Init { update, force } => {
			let reason = if update {
				InstallReason::Update
			} else {
				if store.is_initialized()? && !force {
					anyhow::bail!(
						"{} already exists. Use --force to overwrite.",
						path.display()
					);
				}
				InstallReason::Install
			};

			let config = store
				.install(reason)
				.with_context(|| format!("Failed to write {}", path.display()))?;
			println!(
				"Initialized {} ({} rules)",
				path.display(),
				config.rules.len()
			);
		}
		ConfigAction::Export { output } => {
			let json = store.export().context("Failed to export configuration")?;
			match output {
				Some(file) => {
					std::fs::write(&file, format!("{json}\n"))
						.with_context(|| format!("Failed to write {}", file.display()))?;
					println!("Exported configuration to {}", file.display());
				}
				None => println!("{}", json),
			}
		}
		ConfigAction::Import { file } => {
			let content = std::fs::read_to_string(&file)
				.with_context(|| format!("Failed to read {}", file.display()))?;
			let (config, _) = store
				.import(&content)
				.with_context(|| format!("Failed to import {}", file.display()))?;
			println!("Imported {} rules", config.rules.len());
		}
		ConfigAction::Reset => {
			store.reset().context("Failed to reset configuration")?;
			println!("Configuration reset to defaults");
		}
		ConfigAction::Clear => {
			store.clear_rules().context("Failed to clear rules")?;
			println!("All rules removed");
		}
		ConfigAction::Set {
			enabled,
			open_new_tab,
			notify,
		} => {
			let mut config = store.load().context("Failed to load configuration")?;
			if let Some(enabled) = enabled {
				config.enabled = enabled;
			}
			if let Some(open_new_tab) = open_new_tab {
				config.open_new_tab = open_new_tab;
			}
			if let Some(notify) = notify {
				config.notify_event = notify;
			}
			store.save(config).context("Failed to save configuration")?;
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_watch(store: ConfigStore<FileStorage>, strict: bool) -> Result<ExitCode> {
	let policy = if strict {
		InvalidRegexPolicy::Abort
	} else {
		InvalidRegexPolicy::Skip
	};
	let redirector = Redirector::new(store)
		.context("Failed to load configuration")?
		.with_policy(policy);

	let mut dispatcher = Dispatcher::new();
	dispatcher.subscribe(redirector);

	for line in std::io::stdin().lock().lines() {
		let line = line.context("Failed to read stdin")?;
		if line.trim().is_empty() {
			continue;
		}

		let event: Event = match serde_json::from_str(&line) {
			Ok(event) => event,
			Err(e) => {
				eprintln!("Warning: ignoring malformed event: {}", e);
				continue;
			}
		};

		let out = dispatcher.dispatch(event);
		for effect in &out.effects {
			println!("{}", serde_json::to_string(effect)?);
		}
		for e in &out.errors {
			eprintln!("Warning: event failed: {}", e);
		}
	}

	Ok(ExitCode::SUCCESS)
}
