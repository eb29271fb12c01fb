//! Hover request feature.
//!
//! Unlike the lifecycle features, hover does not observe the environment:
//! registrations publish a provider into a host-owned registry, and the
//! host invokes the provider with position params whenever it wants hover
//! content. The provider forwards the params to the server and relays its
//! response.

use std::sync::Arc;

use futures::future::BoxFuture;
use lsp_types::request::{HoverRequest, Request};
use lsp_types::{
	ClientCapabilities, DocumentSelector, Hover, HoverParams, MarkupKind, Registration,
	TextDocumentPositionParams, WorkDoneProgressParams,
};

use super::{Feature, decode_text_document_options};
use crate::Result;
use crate::registration::{Disposer, Registrations};
use crate::transport::Transport;
use crate::types::AnyRequest;

/// Asynchronous hover computation handed to a provider registry.
///
/// Dropping the returned future abandons the underlying request;
/// cancellation propagates when the transport supports it.
pub type HoverProvider = Arc<
	dyn Fn(TextDocumentPositionParams) -> BoxFuture<'static, Result<Option<Hover>>> + Send + Sync,
>;

/// Host-side registry of hover providers keyed by document selector.
pub trait HoverProviderRegistry: Send + Sync {
	/// Adds a provider for documents matching `selector`; the returned
	/// disposer removes it again.
	fn register_provider(
		&self,
		selector: Option<DocumentSelector>,
		provider: HoverProvider,
	) -> Disposer;
}

/// `textDocument/hover` support backed by dynamically registered providers.
pub struct HoverFeature {
	transport: Arc<dyn Transport>,
	registry: Arc<dyn HoverProviderRegistry>,
	registrations: Registrations,
}

impl HoverFeature {
	/// Creates the feature over `transport`, publishing providers into
	/// `registry`.
	pub fn new(transport: Arc<dyn Transport>, registry: Arc<dyn HoverProviderRegistry>) -> Self {
		Self {
			transport,
			registry,
			registrations: Registrations::new(),
		}
	}

	/// Number of active registrations.
	pub fn active_count(&self) -> usize {
		self.registrations.len()
	}

	fn provider(&self) -> HoverProvider {
		let transport = self.transport.clone();
		Arc::new(move |position_params| {
			let transport = transport.clone();
			Box::pin(async move {
				let params = HoverParams {
					text_document_position_params: position_params,
					work_done_progress_params: WorkDoneProgressParams::default(),
				};
				let response = transport
					.request(AnyRequest::new::<HoverRequest>(params))
					.await?;
				// A null result means the server has nothing to show.
				Ok(serde_json::from_value(response)?)
			})
		})
	}
}

impl Feature for HoverFeature {
	fn method(&self) -> &'static str {
		HoverRequest::METHOD
	}

	fn fill_client_capabilities(&self, capabilities: &mut ClientCapabilities) {
		let hover = capabilities
			.text_document
			.get_or_insert_default()
			.hover
			.get_or_insert_default();
		hover.dynamic_registration = Some(true);
		hover.content_format = Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]);
	}

	fn register(&self, registration: Registration) -> Result<()> {
		let options = decode_text_document_options(registration.register_options)?;
		self.registrations.insert_with(&registration.id, || {
			self.registry
				.register_provider(options.document_selector, self.provider())
		})
	}

	fn unregister(&self, id: &str) -> Result<()> {
		self.registrations.remove(id)
	}

	fn unregister_all(&self) {
		self.registrations.dispose_all();
	}
}
