//! Language client feature layer: dynamic capability registration and
//! document synchronization.
//!
//! This crate sits between a host editor and the connection driving a
//! language server. The host supplies two collaborators: a [`Transport`]
//! carrying protocol messages, and an environment watch channel publishing
//! the currently active document (see [`vesper_environment`]). Features
//! translate between those two worlds:
//!
//! - [`DidOpenFeature`] / [`DidCloseFeature`] observe environment
//!   transitions and keep the server's set of open documents in sync.
//! - [`HoverFeature`] publishes providers that forward positional requests
//!   to the server and relay its responses.
//! - [`FeatureSet`] groups features and routes the server's
//!   `client/registerCapability` / `client/unregisterCapability` payloads to
//!   them by method.
//!
//! Registrations are scoped by [document selectors](matcher::matches) and
//! released through explicit [`Disposer`] handles; a disposer's cleanup runs
//! exactly once, on disposal or on drop.
#![warn(missing_docs)]

/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
/// Re-export of the [`vesper_environment`] dependency of this crate.
pub use vesper_environment;

pub use serde_json::Value as JsonValue;

pub mod features;
pub mod matcher;
mod registration;
mod transport;
mod types;

pub use features::hover::{HoverFeature, HoverProvider, HoverProviderRegistry};
pub use features::text_document::{
	DidCloseFeature, DidOpenFeature, DocumentTransition, TextDocumentNotificationFeature,
	TransitionParams,
};
pub use features::{Feature, FeatureSet};
pub use matcher::matches;
pub use registration::{Disposer, Registrations};
pub use transport::Transport;
pub use types::{AnyNotification, AnyRequest, ErrorCode, ResponseError};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// A registration was added with an id that is already active.
	#[error("duplicate registration: {0}")]
	DuplicateRegistration(String),
	/// An unregistration named an id that is not active.
	#[error("unknown registration: {0}")]
	UnknownRegistration(String),
	/// A (un)registration named a method no feature handles.
	#[error("unsupported method: {0}")]
	UnsupportedMethod(String),
	/// The peer replies undecodable or invalid payloads.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// The peer replies an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// The underlying transport channel is closed.
	#[error("the underlying transport channel is closed")]
	ChannelClosed,
}
