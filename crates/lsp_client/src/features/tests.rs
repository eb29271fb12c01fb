use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lsp_types::{
	ClientCapabilities, DocumentSelector, Registration, RegistrationParams, ServerCapabilities,
	Unregistration, UnregistrationParams,
};
use pretty_assertions::assert_eq;

use super::{Feature, FeatureSet};
use crate::registration::{Disposer, Registrations};
use crate::{Error, Result};

struct RecordingFeature {
	method: &'static str,
	registrations: Registrations,
	initialized: AtomicUsize,
}

impl RecordingFeature {
	fn new(method: &'static str) -> Arc<Self> {
		Arc::new(Self {
			method,
			registrations: Registrations::new(),
			initialized: AtomicUsize::new(0),
		})
	}

	fn active_count(&self) -> usize {
		self.registrations.len()
	}

	fn initialized_count(&self) -> usize {
		self.initialized.load(Ordering::SeqCst)
	}
}

impl Feature for RecordingFeature {
	fn method(&self) -> &'static str {
		self.method
	}

	fn fill_client_capabilities(&self, _capabilities: &mut ClientCapabilities) {}

	fn initialize(
		&self,
		_server_capabilities: &ServerCapabilities,
		_default_selector: Option<&DocumentSelector>,
	) {
		self.initialized.fetch_add(1, Ordering::SeqCst);
	}

	fn register(&self, registration: Registration) -> Result<()> {
		self.registrations
			.insert_with(&registration.id, Disposer::noop)
	}

	fn unregister(&self, id: &str) -> Result<()> {
		self.registrations.remove(id)
	}

	fn unregister_all(&self) {
		self.registrations.dispose_all();
	}
}

fn registration(id: &str, method: &str) -> Registration {
	Registration {
		id: id.into(),
		method: method.into(),
		register_options: None,
	}
}

fn unregistration(id: &str, method: &str) -> Unregistration {
	Unregistration {
		id: id.into(),
		method: method.into(),
	}
}

#[test]
fn routes_registrations_by_method() {
	let open = RecordingFeature::new("textDocument/didOpen");
	let close = RecordingFeature::new("textDocument/didClose");
	let set = FeatureSet::new().with(open.clone()).with(close.clone());

	set.register_capability(RegistrationParams {
		registrations: vec![registration("r1", "textDocument/didClose")],
	})
	.expect("register");

	assert_eq!(open.active_count(), 0);
	assert_eq!(close.active_count(), 1);
}

#[test]
fn unknown_method_is_rejected() {
	let set = FeatureSet::new().with(RecordingFeature::new("textDocument/didOpen"));

	let result = set.register_capability(RegistrationParams {
		registrations: vec![registration("r1", "textDocument/hover")],
	});
	assert!(matches!(result, Err(Error::UnsupportedMethod(method)) if method == "textDocument/hover"));

	let result = set.unregister_capability(UnregistrationParams {
		unregisterations: vec![unregistration("r1", "textDocument/hover")],
	});
	assert!(matches!(result, Err(Error::UnsupportedMethod(_))));
}

#[test]
fn batch_stops_at_the_first_failure() {
	let open = RecordingFeature::new("textDocument/didOpen");
	let set = FeatureSet::new().with(open.clone());

	set.register_capability(RegistrationParams {
		registrations: vec![registration("r1", "textDocument/didOpen")],
	})
	.expect("register");

	let result = set.register_capability(RegistrationParams {
		registrations: vec![
			registration("r2", "textDocument/didOpen"),
			registration("r1", "textDocument/didOpen"),
			registration("r3", "textDocument/didOpen"),
		],
	});
	assert!(matches!(result, Err(Error::DuplicateRegistration(_))));

	// r2 was applied before the failure; r3 never was.
	assert_eq!(open.active_count(), 2);
	set.unregister_capability(UnregistrationParams {
		unregisterations: vec![
			unregistration("r1", "textDocument/didOpen"),
			unregistration("r2", "textDocument/didOpen"),
		],
	})
	.expect("both applied registrations removable");
	assert_eq!(open.active_count(), 0);
}

#[test]
fn unregistration_batch_preserves_order_and_aborts_on_failure() {
	let open = RecordingFeature::new("textDocument/didOpen");
	let set = FeatureSet::new().with(open.clone());
	set.register_capability(RegistrationParams {
		registrations: vec![
			registration("r1", "textDocument/didOpen"),
			registration("r2", "textDocument/didOpen"),
		],
	})
	.expect("register");

	let result = set.unregister_capability(UnregistrationParams {
		unregisterations: vec![
			unregistration("r1", "textDocument/didOpen"),
			unregistration("nope", "textDocument/didOpen"),
			unregistration("r2", "textDocument/didOpen"),
		],
	});
	assert!(matches!(result, Err(Error::UnknownRegistration(_))));
	// r1 was removed before the failure; r2 survived it.
	assert_eq!(open.active_count(), 1);
}

#[test]
fn initialize_runs_once_per_set() {
	let open = RecordingFeature::new("textDocument/didOpen");
	let hover = RecordingFeature::new("textDocument/hover");
	let set = FeatureSet::new().with(open.clone()).with(hover.clone());

	let server_capabilities = ServerCapabilities::default();
	set.initialize(&server_capabilities, None);
	set.initialize(&server_capabilities, None);

	assert_eq!(open.initialized_count(), 1);
	assert_eq!(hover.initialized_count(), 1);
}

#[test]
fn fill_client_capabilities_visits_every_feature() {
	struct MarkingFeature {
		method: &'static str,
		filled: AtomicUsize,
	}

	impl Feature for MarkingFeature {
		fn method(&self) -> &'static str {
			self.method
		}

		fn fill_client_capabilities(&self, _capabilities: &mut ClientCapabilities) {
			self.filled.fetch_add(1, Ordering::SeqCst);
		}

		fn register(&self, _registration: Registration) -> Result<()> {
			Ok(())
		}

		fn unregister(&self, _id: &str) -> Result<()> {
			Ok(())
		}

		fn unregister_all(&self) {}
	}

	let first = Arc::new(MarkingFeature {
		method: "a/x",
		filled: AtomicUsize::new(0),
	});
	let second = Arc::new(MarkingFeature {
		method: "b/y",
		filled: AtomicUsize::new(0),
	});
	let set = FeatureSet::new().with(first.clone()).with(second.clone());

	let mut capabilities = ClientCapabilities::default();
	set.fill_client_capabilities(&mut capabilities);
	assert_eq!(first.filled.load(Ordering::SeqCst), 1);
	assert_eq!(second.filled.load(Ordering::SeqCst), 1);
}

#[test]
fn unregister_all_tears_down_every_feature() {
	let open = RecordingFeature::new("textDocument/didOpen");
	let hover = RecordingFeature::new("textDocument/hover");
	let set = FeatureSet::new().with(open.clone()).with(hover.clone());
	set.register_capability(RegistrationParams {
		registrations: vec![
			registration("r1", "textDocument/didOpen"),
			registration("r2", "textDocument/hover"),
		],
	})
	.expect("register");

	set.unregister_all();
	assert_eq!(open.active_count(), 0);
	assert_eq!(hover.active_count(), 0);
}
