//! Text document lifecycle features.
//!
//! [`TextDocumentNotificationFeature`] binds dynamic registrations to
//! document selectors and turns environment transitions into
//! document-scoped notifications; [`DidOpenFeature`] and
//! [`DidCloseFeature`] are its open/close instantiations.
//!
//! Every feature instance owns a driver task observing the environment
//! watch channel. The driver compares the latest snapshot against the
//! document currently tracked open and applies at most one close edge and
//! one open edge per observed change, in that order. Document identity is
//! the URI: the same document persisting across snapshots is a no-op, no
//! matter what else changed around it.

use std::collections::HashMap;
use std::sync::Arc;

use lsp_types::notification::{DidCloseTextDocument, DidOpenTextDocument, Notification};
use lsp_types::{
	ClientCapabilities, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentSelector,
	Registration, ServerCapabilities, TextDocumentIdentifier, TextDocumentItem,
	TextDocumentRegistrationOptions, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use parking_lot::Mutex;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, warn};
use uuid::Uuid;
use vesper_environment::EnvironmentReceiver;

use super::{Feature, decode_text_document_options};
use crate::registration::{Disposer, Registrations};
use crate::transport::Transport;
use crate::types::AnyNotification;
use crate::{JsonValue, Result, matcher};

/// An edge in a document's open/close lifecycle.
#[derive(Debug, Clone, Copy)]
pub enum DocumentTransition<'a> {
	/// The document became relevant to the server.
	Opened(&'a TextDocumentItem),
	/// The document stopped being relevant to the server.
	Closed(&'a TextDocumentItem),
}

/// Maps a lifecycle edge to at most one outbound notification payload.
pub type TransitionParams =
	Box<dyn Fn(DocumentTransition<'_>) -> Option<JsonValue> + Send + Sync>;

struct SyncState {
	/// Active registration id → document selector.
	selectors: HashMap<String, Option<DocumentSelector>>,
	/// The document the server currently considers open, if any.
	open: Option<TextDocumentItem>,
}

struct Inner {
	method: &'static str,
	transport: Arc<dyn Transport>,
	create_params: TransitionParams,
	state: Mutex<SyncState>,
}

impl Inner {
	/// Applies the latest observed snapshot to the open/close state machine.
	fn apply_snapshot(&self, state: &mut SyncState, active: Option<TextDocumentItem>) {
		if let (Some(open), Some(active)) = (state.open.as_ref(), active.as_ref())
			&& open.uri == active.uri
		{
			// Same identity persisting, whatever else changed around it.
			return;
		}
		if let Some(closed) = state.open.take() {
			self.emit(DocumentTransition::Closed(&closed));
		}
		if let Some(document) = active
			&& state
				.selectors
				.values()
				.any(|selector| matcher::matches(selector.as_ref(), &document))
		{
			self.emit(DocumentTransition::Opened(&document));
			state.open = Some(document);
		}
	}

	fn emit(&self, transition: DocumentTransition<'_>) {
		let Some(params) = (self.create_params)(transition) else {
			return;
		};
		let notification = AnyNotification {
			method: self.method.into(),
			params,
		};
		if let Err(error) = self.transport.notify(notification) {
			warn!(method = %self.method, error = %error, "Failed to send document notification");
		}
	}
}

async fn drive(inner: Arc<Inner>, mut environment: EnvironmentReceiver) {
	loop {
		{
			// Read and apply the head under a single lock so a concurrent
			// register cannot act on a newer snapshot first.
			let mut state = inner.state.lock();
			let active = environment.borrow_and_update().active_document().cloned();
			inner.apply_snapshot(&mut state, active);
		}
		if environment.changed().await.is_err() {
			break;
		}
	}
}

/// Dynamic registration of document-scoped notifications driven by
/// environment transitions.
///
/// Emission happens under the feature's internal lock: a [`Transport`]
/// implementation must not call back into `register`/`unregister` from
/// inside `notify`.
pub struct TextDocumentNotificationFeature {
	inner: Arc<Inner>,
	registrations: Registrations,
	environment: EnvironmentReceiver,
	_driver: AbortOnDropHandle<()>,
}

impl TextDocumentNotificationFeature {
	/// Creates a feature emitting `method` notifications built by
	/// `create_params`, driven by `environment`.
	///
	/// Must be called inside a Tokio runtime; the driver task is aborted
	/// when the feature is dropped.
	pub fn new(
		transport: Arc<dyn Transport>,
		environment: EnvironmentReceiver,
		method: &'static str,
		create_params: TransitionParams,
	) -> Self {
		let inner = Arc::new(Inner {
			method,
			transport,
			create_params,
			state: Mutex::new(SyncState {
				selectors: HashMap::new(),
				open: None,
			}),
		});
		let driver = AbortOnDropHandle::new(tokio::spawn(drive(inner.clone(), environment.clone())));
		Self {
			inner,
			registrations: Registrations::new(),
			environment,
			_driver: driver,
		}
	}

	/// Number of active registrations.
	pub fn active_count(&self) -> usize {
		self.registrations.len()
	}

	/// Seeds a registration outside the dynamic registration flow, under a
	/// generated id.
	pub fn register_static(&self, selector: Option<DocumentSelector>) -> Result<()> {
		let id = Uuid::new_v4().to_string();
		debug!(method = %self.inner.method, id = %id, "Seeding static registration");
		self.register_selector(
			&id,
			TextDocumentRegistrationOptions {
				document_selector: selector,
			},
		)
	}

	/// Seeds a static registration when the negotiated server capabilities
	/// enable open/close synchronization and a default selector exists.
	pub fn seed_from_server(
		&self,
		server_capabilities: &ServerCapabilities,
		default_selector: Option<&DocumentSelector>,
	) {
		if !supports_open_close(server_capabilities) {
			return;
		}
		let Some(selector) = default_selector else {
			return;
		};
		if let Err(error) = self.register_static(Some(selector.clone())) {
			warn!(method = %self.inner.method, error = %error, "Static registration failed");
		}
	}

	fn register_selector(&self, id: &str, options: TextDocumentRegistrationOptions) -> Result<()> {
		self.registrations.insert_with(id, || {
			let mut state = self.inner.state.lock();
			state
				.selectors
				.insert(id.to_string(), options.document_selector.clone());
			// A document already on screen becomes relevant the moment a
			// matching selector appears, unless one is already tracked open.
			if state.open.is_none() {
				let document = self
					.environment
					.borrow()
					.active_document()
					.filter(|document| {
						matcher::matches(options.document_selector.as_ref(), document)
					})
					.cloned();
				if let Some(document) = document {
					self.inner.emit(DocumentTransition::Opened(&document));
					state.open = Some(document);
				}
			}
			let inner = self.inner.clone();
			let id = id.to_string();
			Disposer::new(move || {
				inner.state.lock().selectors.remove(&id);
			})
		})
	}
}

impl Feature for TextDocumentNotificationFeature {
	fn method(&self) -> &'static str {
		self.inner.method
	}

	fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
		fill_synchronization_capabilities(capabilities);
	}

	fn register(&self, registration: Registration) -> Result<()> {
		let options = decode_text_document_options(registration.register_options)?;
		self.register_selector(&registration.id, options)
	}

	fn unregister(&self, id: &str) -> Result<()> {
		self.registrations.remove(id)
	}

	fn unregister_all(&self) {
		self.registrations.dispose_all();
	}
}

/// `textDocument/didOpen` driven by environment transitions.
pub struct DidOpenFeature {
	feature: TextDocumentNotificationFeature,
}

impl DidOpenFeature {
	/// Creates the feature over `transport`, observing `environment`.
	pub fn new(transport: Arc<dyn Transport>, environment: EnvironmentReceiver) -> Self {
		let feature = TextDocumentNotificationFeature::new(
			transport,
			environment,
			DidOpenTextDocument::METHOD,
			Box::new(|transition| match transition {
				DocumentTransition::Opened(document) => {
					let params = DidOpenTextDocumentParams {
						text_document: document.clone(),
					};
					Some(serde_json::to_value(params).expect("Failed to serialize"))
				}
				DocumentTransition::Closed(_) => None,
			}),
		);
		Self { feature }
	}

	/// Number of active registrations.
	pub fn active_count(&self) -> usize {
		self.feature.active_count()
	}
}

impl Feature for DidOpenFeature {
	fn method(&self) -> &'static str {
		self.feature.method()
	}

	fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
		self.feature.fill_client_capabilities(capabilities);
	}

	fn initialize(
		&self,
		server_capabilities: &ServerCapabilities,
		default_selector: Option<&DocumentSelector>,
	) {
		self.feature.seed_from_server(server_capabilities, default_selector);
	}

	fn register(&self, registration: Registration) -> Result<()> {
		self.feature.register(registration)
	}

	fn unregister(&self, id: &str) -> Result<()> {
		self.feature.unregister(id)
	}

	fn unregister_all(&self) {
		self.feature.unregister_all();
	}
}

/// `textDocument/didClose` driven by environment transitions.
pub struct DidCloseFeature {
	feature: TextDocumentNotificationFeature,
}

impl DidCloseFeature {
	/// Creates the feature over `transport`, observing `environment`.
	pub fn new(transport: Arc<dyn Transport>, environment: EnvironmentReceiver) -> Self {
		let feature = TextDocumentNotificationFeature::new(
			transport,
			environment,
			DidCloseTextDocument::METHOD,
			Box::new(|transition| match transition {
				DocumentTransition::Closed(document) => {
					let params = DidCloseTextDocumentParams {
						text_document: TextDocumentIdentifier {
							uri: document.uri.clone(),
						},
					};
					Some(serde_json::to_value(params).expect("Failed to serialize"))
				}
				DocumentTransition::Opened(_) => None,
			}),
		);
		Self { feature }
	}

	/// Number of active registrations.
	pub fn active_count(&self) -> usize {
		self.feature.active_count()
	}
}

impl Feature for DidCloseFeature {
	fn method(&self) -> &'static str {
		self.feature.method()
	}

	fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
		self.feature.fill_client_capabilities(capabilities);
	}

	fn initialize(
		&self,
		server_capabilities: &ServerCapabilities,
		default_selector: Option<&DocumentSelector>,
	) {
		self.feature.seed_from_server(server_capabilities, default_selector);
	}

	fn register(&self, registration: Registration) -> Result<()> {
		self.feature.register(registration)
	}

	fn unregister(&self, id: &str) -> Result<()> {
		self.feature.unregister(id)
	}

	fn unregister_all(&self) {
		self.feature.unregister_all();
	}
}

/// Advertises dynamic registration for text document synchronization.
fn fill_synchronization_capabilities(capabilities: &mut ClientCapabilities) {
	capabilities
		.text_document
		.get_or_insert_default()
		.synchronization
		.get_or_insert_default()
		.dynamic_registration = Some(true);
}

/// Whether the server negotiated open/close document notifications.
fn supports_open_close(server_capabilities: &ServerCapabilities) -> bool {
	match &server_capabilities.text_document_sync {
		Some(TextDocumentSyncCapability::Kind(kind)) => *kind != TextDocumentSyncKind::NONE,
		Some(TextDocumentSyncCapability::Options(options)) => options.open_close.unwrap_or(false),
		None => false,
	}
}
