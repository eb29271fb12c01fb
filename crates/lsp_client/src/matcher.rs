//! Document selector matching.
//!
//! A selector is an ordered list of filters; a document matches the selector
//! when it matches at least one filter, and matches a filter when every
//! constraint the filter specifies holds. Absent constraints are always
//! satisfied.

use globset::GlobBuilder;
use lsp_types::{DocumentFilter, DocumentSelector, TextDocumentItem};
use tracing::debug;

/// Returns whether `document` matches `selector`.
///
/// An absent selector matches every document. The wildcard `"*"` language
/// or scheme is satisfied by any document; glob patterns are matched
/// against the path component of the document URI, with `*` never crossing
/// path separators.
pub fn matches(selector: Option<&DocumentSelector>, document: &TextDocumentItem) -> bool {
	match selector {
		None => true,
		Some(filters) => filters.iter().any(|filter| filter_matches(filter, document)),
	}
}

fn filter_matches(filter: &DocumentFilter, document: &TextDocumentItem) -> bool {
	if let Some(language) = &filter.language
		&& language != "*"
		&& *language != document.language_id
	{
		return false;
	}
	if let Some(scheme) = &filter.scheme
		&& scheme != "*"
		&& uri_scheme(document.uri.as_str()) != Some(scheme.as_str())
	{
		return false;
	}
	if let Some(pattern) = &filter.pattern
		&& !glob_matches(pattern, uri_path(document.uri.as_str()))
	{
		return false;
	}
	true
}

fn glob_matches(pattern: &str, path: &str) -> bool {
	match GlobBuilder::new(pattern).literal_separator(true).build() {
		Ok(glob) => glob.compile_matcher().is_match(path),
		Err(error) => {
			debug!(pattern = %pattern, error = %error, "Invalid document selector glob");
			false
		}
	}
}

fn uri_scheme(uri: &str) -> Option<&str> {
	uri.split_once(':').map(|(scheme, _)| scheme)
}

fn uri_path(uri: &str) -> &str {
	let rest = match uri.split_once(':') {
		Some((_, rest)) => rest,
		None => uri,
	};
	// With an authority component the path starts at the next slash.
	let path = match rest.strip_prefix("//") {
		Some(with_authority) => match with_authority.find('/') {
			Some(index) => &with_authority[index..],
			None => "",
		},
		None => rest,
	};
	match path.find(['?', '#']) {
		Some(index) => &path[..index],
		None => path,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(uri: &str, language: &str) -> TextDocumentItem {
		TextDocumentItem {
			uri: uri.parse().expect("valid uri"),
			language_id: language.into(),
			version: 0,
			text: String::new(),
		}
	}

	fn language_filter(language: &str) -> DocumentFilter {
		DocumentFilter {
			language: Some(language.into()),
			scheme: None,
			pattern: None,
		}
	}

	#[test]
	fn absent_selector_matches_everything() {
		assert!(matches(None, &doc("file:///f", "l")));
		assert!(matches(None, &doc("untitled:Untitled-1", "plaintext")));
	}

	#[test]
	fn wildcard_language_matches_everything() {
		let selector = vec![language_filter("*")];
		assert!(matches(Some(&selector), &doc("file:///f", "l")));
		assert!(matches(Some(&selector), &doc("untitled:Untitled-1", "other")));
	}

	#[test]
	fn language_must_match() {
		let selector = vec![language_filter("l")];
		assert!(matches(Some(&selector), &doc("file:///f", "l")));
		assert!(!matches(Some(&selector), &doc("file:///f", "x")));
	}

	#[test]
	fn filters_are_disjunctive() {
		let selector = vec![language_filter("a"), language_filter("l")];
		assert!(matches(Some(&selector), &doc("file:///f", "l")));
		assert!(!matches(Some(&selector), &doc("file:///f", "x")));
	}

	#[test]
	fn constraints_within_a_filter_are_conjunctive() {
		let selector = vec![DocumentFilter {
			language: Some("l".into()),
			scheme: Some("untitled".into()),
			pattern: None,
		}];
		assert!(!matches(Some(&selector), &doc("file:///f", "l")));
		assert!(matches(Some(&selector), &doc("untitled:Untitled-1", "l")));
	}

	#[test]
	fn scheme_must_match() {
		let selector = vec![DocumentFilter {
			language: None,
			scheme: Some("file".into()),
			pattern: None,
		}];
		assert!(matches(Some(&selector), &doc("file:///f", "l")));
		assert!(!matches(Some(&selector), &doc("untitled:Untitled-1", "l")));
	}

	#[test]
	fn empty_selector_matches_nothing() {
		let selector = Vec::new();
		assert!(!matches(Some(&selector), &doc("file:///f", "l")));
	}

	#[test]
	fn glob_matches_uri_path() {
		let selector = vec![DocumentFilter {
			language: None,
			scheme: None,
			pattern: Some("**/*.rs".into()),
		}];
		assert!(matches(Some(&selector), &doc("file:///src/main.rs", "rust")));
		assert!(!matches(Some(&selector), &doc("file:///src/main.py", "python")));
	}

	#[test]
	fn glob_star_does_not_cross_separators() {
		let selector = vec![DocumentFilter {
			language: None,
			scheme: None,
			pattern: Some("*.rs".into()),
		}];
		assert!(!matches(Some(&selector), &doc("file:///src/main.rs", "rust")));
	}

	#[test]
	fn invalid_glob_never_matches() {
		let selector = vec![DocumentFilter {
			language: None,
			scheme: None,
			pattern: Some("[".into()),
		}];
		assert!(!matches(Some(&selector), &doc("file:///f", "l")));
	}

	#[test]
	fn test_uri_scheme() {
		assert_eq!(uri_scheme("file:///f"), Some("file"));
		assert_eq!(uri_scheme("untitled:Untitled-1"), Some("untitled"));
		assert_eq!(uri_scheme("no-colon"), None);
	}

	#[test]
	fn test_uri_path() {
		assert_eq!(uri_path("file:///src/main.rs"), "/src/main.rs");
		assert_eq!(uri_path("https://host/a/b?q=1#frag"), "/a/b");
		assert_eq!(uri_path("untitled:Untitled-1"), "Untitled-1");
		assert_eq!(uri_path("https://host"), "");
	}
}
