//! Rule storage, matching and rewriting for redirector.
//!
//! This module handles:
//! - The ordered rule collection with stable ids
//! - First-match-wins URL matching (exact and regex modes)
//! - Replacement template expansion for regex rules

pub mod matcher;
pub mod rewriter;
pub mod ruleset;

pub use matcher::{
	CompiledRule, CompiledRules, InvalidRegexPolicy, Redirect, match_url, try_match_url,
};
pub use rewriter::Substitution;
pub use ruleset::RuleSet;
