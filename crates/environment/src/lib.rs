//! Editor environment snapshots observed by language client features.
//!
//! The environment is the editor state visible from outside the UI: which
//! document the user is looking at and which workspace roots are open.
//! Snapshots are immutable values broadcast over a [`tokio::sync::watch`]
//! channel. Observers always see the latest snapshot and may skip
//! intermediate ones; transitions are detected by comparing consecutive
//! observed values, never by mutating a snapshot in place.

use lsp_types::{TextDocumentItem, Uri};
use tokio::sync::watch;

/// Sender half of an environment channel.
pub type EnvironmentSender = watch::Sender<Environment>;

/// Receiver half of an environment channel.
pub type EnvironmentReceiver = watch::Receiver<Environment>;

/// Immutable snapshot of the observed editor state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
	/// The focused viewer component, if any.
	pub component: Option<Component>,
	/// Workspace root URIs.
	pub roots: Vec<Uri>,
}

/// A viewer component presenting a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
	/// The document presented by the component.
	pub document: TextDocumentItem,
}

impl Environment {
	/// Snapshot with no component and no roots.
	pub const fn empty() -> Self {
		Self {
			component: None,
			roots: Vec::new(),
		}
	}

	/// The document of the focused component, if any.
	pub fn active_document(&self) -> Option<&TextDocumentItem> {
		self.component.as_ref().map(|component| &component.document)
	}

	/// Copy of this snapshot with the focused document replaced.
	pub fn with_active_document(&self, document: Option<TextDocumentItem>) -> Self {
		Self {
			component: document.map(|document| Component { document }),
			roots: self.roots.clone(),
		}
	}
}

/// Creates an environment channel seeded with the given snapshot.
pub fn environment_channel(initial: Environment) -> (EnvironmentSender, EnvironmentReceiver) {
	watch::channel(initial)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn doc(uri: &str) -> TextDocumentItem {
		TextDocumentItem {
			uri: uri.parse().expect("valid uri"),
			language_id: "plaintext".into(),
			version: 0,
			text: String::new(),
		}
	}

	#[test]
	fn empty_has_no_active_document() {
		assert_eq!(Environment::empty().active_document(), None);
	}

	#[test]
	fn with_active_document_replaces_component_and_keeps_roots() {
		let base = Environment {
			component: None,
			roots: vec!["file:///workspace".parse().expect("valid uri")],
		};

		let opened = base.with_active_document(Some(doc("file:///workspace/a.rs")));
		assert_eq!(opened.active_document(), Some(&doc("file:///workspace/a.rs")));
		assert_eq!(opened.roots, base.roots);

		let cleared = opened.with_active_document(None);
		assert_eq!(cleared.active_document(), None);
		assert_eq!(cleared.roots, base.roots);
	}

	#[test]
	fn channel_is_seeded_with_initial_snapshot() {
		let initial = Environment::empty().with_active_document(Some(doc("file:///f")));
		let (_tx, rx) = environment_channel(initial.clone());
		assert_eq!(*rx.borrow(), initial);
	}
}
