use crate::config::types::{Rule, RuleId};
use crate::error::{RedirectorError, Result};
use crate::rules::rewriter::Substitution;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a regex rule whose pattern cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidRegexPolicy {
	/// Log a warning, skip the rule, keep scanning.
	#[default]
	Skip,

	/// Fail the whole match at the first broken rule.
	Abort,
}

/// The outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
	/// The rule that produced the redirect.
	pub rule_id: RuleId,

	/// The rewritten URL.
	pub url: String,
}

#[derive(Debug)]
enum Matcher {
	Exact,
	Regex(Substitution),
	Invalid(Arc<fancy_regex::Error>),
}

/// A rule ready for matching.
#[derive(Debug)]
pub struct CompiledRule {
	/// The original rule.
	pub rule: Rule,

	matcher: Matcher,
}

impl CompiledRule {
	/// Compile a rule. Broken regex patterns are kept and reported when evaluated.
	pub fn compile(rule: &Rule) -> Self {
		let matcher = if !rule.regex {
			Matcher::Exact
		} else {
			match Substitution::new(&rule.src, &rule.dest) {
				Ok(sub) => Matcher::Regex(sub),
				Err(e) => Matcher::Invalid(Arc::new(e)),
			}
		};

		CompiledRule {
			rule: rule.clone(),
			matcher,
		}
	}

	/// Whether the rule's pattern failed to compile.
	pub fn is_invalid(&self) -> bool {
		matches!(self.matcher, Matcher::Invalid(_))
	}

	/// Evaluate this rule against `url`.
	///
	/// Returns the rewritten URL, or `None` when the rule does not apply or
	/// would rewrite the URL to itself.
	pub fn rewrite(&self, url: &str) -> Result<Option<String>> {
		match &self.matcher {
			Matcher::Exact => Ok((url == self.rule.src).then(|| self.rule.dest.clone())),
			Matcher::Regex(sub) => {
				let rewritten = sub
					.apply(url)
					.map_err(|source| RedirectorError::RegexRuntime {
						rule_id: self.rule.id.to_string(),
						pattern: self.rule.src.clone(),
						source: Box::new(source),
					})?;
				Ok(rewritten.filter(|new_url| new_url != url))
			}
			Matcher::Invalid(source) => Err(RedirectorError::InvalidRegex {
				rule_id: self.rule.id.to_string(),
				pattern: self.rule.src.clone(),
				source: Arc::clone(source),
			}),
		}
	}
}

/// Compiled snapshot of an ordered rule list.
#[derive(Debug, Default)]
pub struct CompiledRules {
	rules: Vec<CompiledRule>,
	policy: InvalidRegexPolicy,
}

impl CompiledRules {
	/// Compile the enabled rules of `rules`, preserving order.
	///
	/// Rules with a blank `src` or `dest` are left out.
	pub fn compile(rules: &[Rule]) -> Self {
		let compiled = rules
			.iter()
			.filter(|r| r.enabled && r.is_valid())
			.map(CompiledRule::compile)
			.collect::<Vec<_>>();

		for rule in compiled.iter().filter(|r| r.is_invalid()) {
			warn!(
				rule_id = %rule.rule.id,
				pattern = %rule.rule.src,
				"rule has an invalid regex pattern"
			);
		}

		CompiledRules {
			rules: compiled,
			policy: InvalidRegexPolicy::default(),
		}
	}

	pub fn with_policy(mut self, policy: InvalidRegexPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn policy(&self) -> InvalidRegexPolicy {
		self.policy
	}

	/// Number of enabled rules in the snapshot.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Find the first rule that rewrites `url` to a different URL.
	///
	/// Errors only under [`InvalidRegexPolicy::Abort`].
	pub fn find_redirect(&self, url: &str) -> Result<Option<Redirect>> {
		if url.is_empty() {
			return Ok(None);
		}

		for compiled in &self.rules {
			match compiled.rewrite(url) {
				Ok(Some(new_url)) => {
					debug!(rule_id = %compiled.rule.id, from = url, to = %new_url, "rule matched");
					return Ok(Some(Redirect {
						rule_id: compiled.rule.id.clone(),
						url: new_url,
					}));
				}
				Ok(None) => {}
				Err(e) => match self.policy {
					InvalidRegexPolicy::Skip => {
						warn!(rule_id = %compiled.rule.id, error = %e, "skipping rule");
					}
					InvalidRegexPolicy::Abort => return Err(e),
				},
			}
		}

		Ok(None)
	}
}

/// Match `url` against `rules`, skipping rules whose regex is broken.
pub fn match_url(rules: &[Rule], url: &str) -> Option<String> {
	if rules.is_empty() || url.is_empty() {
		return None;
	}

	CompiledRules::compile(rules)
		.find_redirect(url)
		.ok()
		.flatten()
		.map(|redirect| redirect.url)
}

/// Match `url` against `rules`, failing at the first broken regex rule.
pub fn try_match_url(rules: &[Rule], url: &str) -> Result<Option<String>> {
	if rules.is_empty() || url.is_empty() {
		return Ok(None);
	}

	let redirect = CompiledRules::compile(rules)
		.with_policy(InvalidRegexPolicy::Abort)
		.find_redirect(url)?;
	Ok(redirect.map(|r| r.url))
}
