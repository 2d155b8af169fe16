use fancy_regex::{Captures, Regex};
use std::sync::LazyLock;

/// Tokens with special meaning inside a replacement template.
static TEMPLATE_TOKEN: LazyLock<regex::Regex> = LazyLock::new(|| {
	regex::Regex::new(r"\$(?:(\$)|(&)|(`)|(')|<([^>]*)>|(\d{1,2}))")
		.expect("template token pattern is valid")
});

/// A compiled regex rule: pattern plus replacement template.
///
/// Templates use the `$`-syntax URL rules are commonly written in:
/// `$1`..`$99`, `$<name>`, `$&`, `` $` ``, `$'` and `$$`.
#[derive(Debug)]
pub struct Substitution {
	/// The pattern to search for.
	pub pattern: Regex,

	/// The replacement template.
	pub template: String,

	group_names: Vec<String>,
}

impl Substitution {
	/// Compile `pattern` and pair it with `template`.
	pub fn new(pattern: &str, template: &str) -> Result<Self, fancy_regex::Error> {
		let pattern = Regex::new(pattern)?;
		let group_names = pattern
			.capture_names()
			.flatten()
			.map(str::to_string)
			.collect();

		Ok(Substitution {
			pattern,
			template: template.to_string(),
			group_names,
		})
	}

	/// Replace the first match in `input`.
	///
	/// Returns `Ok(None)` when the pattern does not occur in `input`.
	/// Errors only on engine runtime failures such as the backtrack limit.
	pub fn apply(&self, input: &str) -> Result<Option<String>, fancy_regex::Error> {
		let Some(caps) = self.pattern.captures(input)? else {
			return Ok(None);
		};
		let Some(whole) = caps.get(0) else {
			return Ok(None);
		};

		let mut output = String::with_capacity(input.len() + self.template.len());
		output.push_str(&input[..whole.start()]);
		output.push_str(&self.expand(&caps, input, whole.start(), whole.end()));
		output.push_str(&input[whole.end()..]);
		Ok(Some(output))
	}

	fn expand(&self, caps: &Captures, input: &str, start: usize, end: usize) -> String {
		// Group 0 is the whole match.
		let group_count = caps.len().saturating_sub(1);
		let group = |n: usize| caps.get(n).map(|m| m.as_str()).unwrap_or("");

		TEMPLATE_TOKEN
			.replace_all(&self.template, |token: &regex::Captures| {
				if token.get(1).is_some() {
					return "$".to_string();
				}
				if token.get(2).is_some() {
					return input[start..end].to_string();
				}
				if token.get(3).is_some() {
					return input[..start].to_string();
				}
				if token.get(4).is_some() {
					return input[end..].to_string();
				}
				if let Some(name) = token.get(5) {
					if self.group_names.is_empty() {
						return token[0].to_string();
					}
					return caps
						.name(name.as_str())
						.map(|m| m.as_str().to_string())
						.unwrap_or_default();
				}

				let digits = &token[6];
				let in_range = |n: usize| n >= 1 && n <= group_count;
				if let Ok(n) = digits.parse::<usize>()
					&& in_range(n)
				{
					return group(n).to_string();
				}
				if digits.len() == 2 {
					let first = usize::from(digits.as_bytes()[0] - b'0');
					if in_range(first) {
						return format!("{}{}", group(first), &digits[1..]);
					}
				}
				token[0].to_string()
			})
			.into_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn apply(pattern: &str, template: &str, input: &str) -> Option<String> {
		Substitution::new(pattern, template)
			.unwrap()
			.apply(input)
			.unwrap()
	}

	#[test]
	fn test_no_match_returns_none() {
		assert_eq!(apply("foo", "bar", "https://example.com/"), None);
	}

	#[test]
	fn test_replaces_first_occurrence_only() {
		assert_eq!(apply("o", "0", "foo boo").as_deref(), Some("f0o boo"));
	}

	#[test]
	fn test_keeps_text_around_match() {
		assert_eq!(
			apply("example\\.com", "example.org", "https://example.com/a").as_deref(),
			Some("https://example.org/a")
		);
	}

	#[test]
	fn test_numbered_groups() {
		assert_eq!(
			apply(
				r"^https?://([^/]+)(.*)$",
				"https://mirror.test/$1$2",
				"http://foo.test/page"
			)
			.as_deref(),
			Some("https://mirror.test/foo.test/page")
		);
	}

	#[test]
	fn test_group_followed_by_text() {
		// `$1abc` is group 1 then literal "abc"
		assert_eq!(apply("(b)", "$1abc", "b").as_deref(), Some("babc"));
	}

	#[test]
	fn test_two_digit_reference_falls_back_to_one_digit() {
		assert_eq!(apply("(a)(b)", "$21", "ab").as_deref(), Some("b1"));
	}

	#[test]
	fn test_missing_group_is_literal() {
		assert_eq!(apply("(a)", "$2", "a").as_deref(), Some("$2"));
		assert_eq!(apply("(a)", "$0", "a").as_deref(), Some("$0"));
	}

	#[test]
	fn test_unmatched_optional_group_is_empty() {
		assert_eq!(apply("a(x)?", "[$1]", "a").as_deref(), Some("[]"));
	}

	#[test]
	fn test_whole_match_and_dollar_escape() {
		assert_eq!(apply("b", "<$&>$$", "abc").as_deref(), Some("a<b>$c"));
	}

	#[test]
	fn test_prefix_and_suffix_tokens() {
		assert_eq!(apply("b", "[$`|$']", "abc").as_deref(), Some("a[a|c]c"));
	}

	#[test]
	fn test_named_groups() {
		assert_eq!(
			apply(r"//(?<host>[^/]+)/", "//$<host>.proxy/", "https://a.test/x").as_deref(),
			Some("https://a.test.proxy/x")
		);
	}

	#[test]
	fn test_named_reference_without_named_groups_is_literal() {
		assert_eq!(apply("(a)", "$<x>", "a").as_deref(), Some("$<x>"));
	}

	#[test]
	fn test_negative_lookahead() {
		let sub = Substitution::new(r"^https?://(?!localhost)([^/]+)(.*)$", "https://localhost/")
			.unwrap();
		assert_eq!(
			sub.apply("http://foo.test/page").unwrap().as_deref(),
			Some("https://localhost/")
		);
		assert_eq!(sub.apply("http://localhost/page").unwrap(), None);
	}

	#[test]
	fn test_invalid_pattern() {
		assert!(Substitution::new("[invalid", "x").is_err());
	}
}
