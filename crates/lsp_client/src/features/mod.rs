//! Client-side protocol features.
//!
//! A [`Feature`] owns the registrations of one protocol method: it
//! advertises client capabilities during the handshake, activates and
//! deactivates registrations, and honors statically negotiated server
//! capabilities. A [`FeatureSet`] groups features behind the server's
//! dynamic (un)registration round trips.

pub mod hover;
pub mod text_document;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lsp_types::{
	ClientCapabilities, DocumentSelector, Registration, RegistrationParams, ServerCapabilities,
	TextDocumentRegistrationOptions, Unregistration, UnregistrationParams,
};
use tracing::{debug, warn};

use crate::{Error, JsonValue, Result};

/// A client-side protocol feature with dynamically registrable behavior.
pub trait Feature: Send + Sync {
	/// The protocol method this feature handles.
	///
	/// Descriptive metadata used by [`FeatureSet`] routing; features never
	/// branch on it internally.
	fn method(&self) -> &'static str;

	/// Advertises this feature's support in the capabilities sent during
	/// the handshake. Additive; never fails.
	fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities);

	/// Honors statically negotiated server capabilities, once, after the
	/// handshake completes. The default does nothing.
	fn initialize(
		&self,
		_server_capabilities: &ServerCapabilities,
		_default_selector: Option<&DocumentSelector>,
	) {
	}

	/// Activates a registration.
	fn register(&self, registration: Registration) -> Result<()>;

	/// Deactivates the registration under `id`.
	fn unregister(&self, id: &str) -> Result<()>;

	/// Deactivates every active registration.
	fn unregister_all(&self);
}

/// Decodes text document registration options from a raw registration
/// payload. Absent options carry an absent selector, which matches every
/// document.
pub(crate) fn decode_text_document_options(
	options: Option<JsonValue>,
) -> Result<TextDocumentRegistrationOptions> {
	match options {
		None | Some(JsonValue::Null) => Ok(TextDocumentRegistrationOptions {
			document_selector: None,
		}),
		Some(value) => Ok(serde_json::from_value(value)?),
	}
}

/// An ordered collection of features sharing one server connection.
pub struct FeatureSet {
	features: Vec<Arc<dyn Feature>>,
	initialized: AtomicBool,
}

impl FeatureSet {
	/// Empty set.
	pub fn new() -> Self {
		Self {
			features: Vec::new(),
			initialized: AtomicBool::new(false),
		}
	}

	/// Adds a feature.
	pub fn push(&mut self, feature: Arc<dyn Feature>) {
		self.features.push(feature);
	}

	/// Builder-style [`push`](Self::push).
	#[must_use]
	pub fn with(mut self, feature: Arc<dyn Feature>) -> Self {
		self.push(feature);
		self
	}

	/// The feature handling `method`, if any.
	pub fn feature(&self, method: &str) -> Option<&Arc<dyn Feature>> {
		self.features.iter().find(|feature| feature.method() == method)
	}

	/// Collects every feature's capability advertisement.
	pub fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
		for feature in &self.features {
			feature.fill_client_capabilities(capabilities);
		}
	}

	/// Runs post-handshake initialization, at most once per set.
	pub fn initialize(
		&self,
		server_capabilities: &ServerCapabilities,
		default_selector: Option<&DocumentSelector>,
	) {
		if self.initialized.swap(true, Ordering::SeqCst) {
			warn!("Feature set initialized more than once");
			return;
		}
		for feature in &self.features {
			feature.initialize(server_capabilities, default_selector);
		}
	}

	/// Applies a `client/registerCapability` payload.
	///
	/// Registrations apply in payload order; the first failure aborts the
	/// remainder and is returned.
	pub fn register_capability(&self, params: RegistrationParams) -> Result<()> {
		for registration in params.registrations {
			self.register(registration)?;
		}
		Ok(())
	}

	fn register(&self, registration: Registration) -> Result<()> {
		let Some(feature) = self.feature(&registration.method) else {
			return Err(Error::UnsupportedMethod(registration.method));
		};
		debug!(method = %registration.method, id = %registration.id, "Registering capability");
		feature.register(registration)
	}

	/// Applies a `client/unregisterCapability` payload.
	///
	/// Unregistrations apply in payload order; the first failure aborts the
	/// remainder and is returned.
	pub fn unregister_capability(&self, params: UnregistrationParams) -> Result<()> {
		for unregistration in params.unregisterations {
			self.unregister(unregistration)?;
		}
		Ok(())
	}

	fn unregister(&self, unregistration: Unregistration) -> Result<()> {
		let Some(feature) = self.feature(&unregistration.method) else {
			return Err(Error::UnsupportedMethod(unregistration.method));
		};
		debug!(method = %unregistration.method, id = %unregistration.id, "Unregistering capability");
		feature.unregister(&unregistration.id)
	}

	/// Tears down every feature's registrations.
	pub fn unregister_all(&self) {
		for feature in &self.features {
			feature.unregister_all();
		}
	}
}

impl Default for FeatureSet {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests;
