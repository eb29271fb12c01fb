//! Registration bookkeeping shared by every feature.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::{Error, Result};

/// Cleanup handle of a single registration.
///
/// The wrapped cleanup runs exactly once: on [`dispose`](Self::dispose) or,
/// if never disposed explicitly, on drop.
pub struct Disposer {
	cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
	/// Wraps a cleanup closure.
	pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
		Self {
			cleanup: Some(Box::new(cleanup)),
		}
	}

	/// A disposer with nothing to clean up.
	pub fn noop() -> Self {
		Self { cleanup: None }
	}

	/// Runs the cleanup now.
	pub fn dispose(mut self) {
		if let Some(cleanup) = self.cleanup.take() {
			cleanup();
		}
	}
}

impl Drop for Disposer {
	fn drop(&mut self) {
		if let Some(cleanup) = self.cleanup.take() {
			cleanup();
		}
	}
}

impl fmt::Debug for Disposer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Disposer")
			.field("armed", &self.cleanup.is_some())
			.finish()
	}
}

/// Active registrations of one feature instance, keyed by registration id.
#[derive(Debug, Default)]
pub struct Registrations {
	active: Mutex<HashMap<String, Disposer>>,
}

impl Registrations {
	/// Empty bookkeeping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores the disposer produced by `subscribe` under `id`.
	///
	/// Fails with [`Error::DuplicateRegistration`] before `subscribe` runs
	/// if the id is already active, leaving the existing registration
	/// untouched.
	pub fn insert_with(&self, id: &str, subscribe: impl FnOnce() -> Disposer) -> Result<()> {
		let mut active = self.active.lock();
		if active.contains_key(id) {
			return Err(Error::DuplicateRegistration(id.to_string()));
		}
		let disposer = subscribe();
		active.insert(id.to_string(), disposer);
		Ok(())
	}

	/// Disposes and removes the registration under `id`.
	///
	/// Fails with [`Error::UnknownRegistration`] if the id was never
	/// registered or was already removed; other registrations are untouched.
	pub fn remove(&self, id: &str) -> Result<()> {
		let disposer = self
			.active
			.lock()
			.remove(id)
			.ok_or_else(|| Error::UnknownRegistration(id.to_string()))?;
		disposer.dispose();
		Ok(())
	}

	/// Disposes every active registration.
	pub fn dispose_all(&self) {
		let drained: Vec<Disposer> = self
			.active
			.lock()
			.drain()
			.map(|(_, disposer)| disposer)
			.collect();
		for disposer in drained {
			disposer.dispose();
		}
	}

	/// Number of active registrations.
	pub fn len(&self) -> usize {
		self.active.lock().len()
	}

	/// Whether no registration is active.
	pub fn is_empty(&self) -> bool {
		self.active.lock().is_empty()
	}
}
