//! Redirector - rule-based URL redirection.
//!
//! This library provides the core functionality for redirector, including:
//! - An ordered rule list with stable ids and explicit reordering
//! - First-match-wins URL matching with exact and regex rules
//! - Configuration storage, import and export
//! - A redirector service driven by navigation and change-notification events
//!
//! # Example
//!
//! ```
//! use redirector_cli::config::Rule;
//! use redirector_cli::rules::match_url;
//!
//! let rules = [
//!     Rule::exact("https://example.com/", "https://example.org/"),
//!     Rule::regex("^http://(.*)$", "https://$1"),
//! ];
//!
//! assert_eq!(
//!     match_url(&rules, "https://example.com/").as_deref(),
//!     Some("https://example.org/")
//! );
//! assert_eq!(
//!     match_url(&rules, "http://plain.test/a").as_deref(),
//!     Some("https://plain.test/a")
//! );
//! assert_eq!(match_url(&rules, "https://other.test/"), None);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod navigation;
pub mod rules;

pub use error::{RedirectorError, Result};
