use crate::config::types::{Rule, RuleId};
use crate::error::{RedirectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered collection of rules addressed by stable ids.
///
/// Order is priority: the matcher evaluates rules front to back.
/// Deserialization repairs duplicate ids so lookups stay unambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Rule>")]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
	pub fn new() -> Self {
		RuleSet(Vec::new())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
		self.0.iter()
	}

	pub fn as_slice(&self) -> &[Rule] {
		&self.0
	}

	/// Append a rule at the lowest priority. Returns its id.
	pub fn push(&mut self, rule: Rule) -> RuleId {
		let id = rule.id.clone();
		self.0.push(rule);
		id
	}

	pub fn get(&self, id: &RuleId) -> Option<&Rule> {
		self.0.iter().find(|r| &r.id == id)
	}

	pub fn get_mut(&mut self, id: &RuleId) -> Option<&mut Rule> {
		self.0.iter_mut().find(|r| &r.id == id)
	}

	pub fn position(&self, id: &RuleId) -> Option<usize> {
		self.0.iter().position(|r| &r.id == id)
	}

	/// Remove a rule by id, returning it.
	pub fn remove(&mut self, id: &RuleId) -> Result<Rule> {
		let index = self.position(id).ok_or_else(|| not_found(id))?;
		Ok(self.0.remove(index))
	}

	/// Toggle a rule on or off.
	pub fn set_enabled(&mut self, id: &RuleId, enabled: bool) -> Result<()> {
		let rule = self.get_mut(id).ok_or_else(|| not_found(id))?;
		rule.enabled = enabled;
		Ok(())
	}

	/// Move a rule so it ends up at `index`, shifting the others.
	pub fn move_to(&mut self, id: &RuleId, index: usize) -> Result<()> {
		let from = self.position(id).ok_or_else(|| not_found(id))?;
		if index >= self.0.len() {
			return Err(RedirectorError::InvalidPosition {
				index,
				len: self.0.len(),
			});
		}

		let rule = self.0.remove(from);
		self.0.insert(index, rule);
		Ok(())
	}

	/// Drop rules with a blank `src` or `dest`. Returns how many were dropped.
	pub fn retain_valid(&mut self) -> usize {
		let before = self.0.len();
		self.0.retain(Rule::is_valid);
		before - self.0.len()
	}

	/// Drop later rules that repeat an earlier rule's `src` and `dest`.
	pub fn dedup_targets(&mut self) -> usize {
		let before = self.0.len();
		let mut seen = HashSet::new();
		self.0.retain(|r| seen.insert((r.src.clone(), r.dest.clone())));
		before - self.0.len()
	}

	/// Replace ids that collide with an earlier rule's id.
	pub fn ensure_unique_ids(&mut self) {
		let mut seen = HashSet::new();
		for rule in &mut self.0 {
			while !seen.insert(rule.id.clone()) {
				rule.id = RuleId::generate();
			}
		}
	}
}

fn not_found(id: &RuleId) -> RedirectorError {
	RedirectorError::RuleNotFound { id: id.to_string() }
}

impl From<Vec<Rule>> for RuleSet {
	fn from(rules: Vec<Rule>) -> Self {
		let mut set = RuleSet(rules);
		set.ensure_unique_ids();
		set
	}
}

impl FromIterator<Rule> for RuleSet {
	fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
		RuleSet::from(iter.into_iter().collect::<Vec<_>>())
	}
}

impl<'a> IntoIterator for &'a RuleSet {
	type Item = &'a Rule;
	type IntoIter = std::slice::Iter<'a, Rule>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
