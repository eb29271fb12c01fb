//! Wire-level message vocabulary shared with the transport.

use std::fmt;

use lsp_types::notification::Notification;
use lsp_types::request::Request;
use serde::{Deserialize, Serialize};

use crate::JsonValue;

/// A notification message ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyNotification {
	/// The method to be invoked.
	pub method: String,
	/// The notification's params, already serialized.
	pub params: JsonValue,
}

impl AnyNotification {
	/// Builds the envelope of a typed notification.
	pub fn new<N: Notification>(params: N::Params) -> Self {
		Self {
			method: N::METHOD.into(),
			params: serde_json::to_value(params).expect("Failed to serialize"),
		}
	}
}

/// A request message ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyRequest {
	/// The method to be invoked.
	pub method: String,
	/// The request's params, already serialized.
	pub params: JsonValue,
}

impl AnyRequest {
	/// Builds the envelope of a typed request.
	pub fn new<R: Request>(params: R::Params) -> Self {
		Self {
			method: R::METHOD.into(),
			params: serde_json::to_value(params).expect("Failed to serialize"),
		}
	}
}

/// The error object in case a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[non_exhaustive]
#[error("{message} ({code})")]
pub struct ResponseError {
	/// A number indicating the error type that occurred.
	pub code: ErrorCode,
	/// A short description of the error.
	pub message: String,
	/// Additional structured information about the error, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// Creates the error with no additional data.
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}
}

/// A number indicating the error type that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
	/// Invalid JSON was received by the server.
	pub const PARSE_ERROR: Self = Self(-32700);
	/// The JSON sent is not a valid Request object.
	pub const INVALID_REQUEST: Self = Self(-32600);
	/// The method does not exist / is not available.
	pub const METHOD_NOT_FOUND: Self = Self(-32601);
	/// Invalid method parameter(s).
	pub const INVALID_PARAMS: Self = Self(-32602);
	/// Internal JSON-RPC error.
	pub const INTERNAL_ERROR: Self = Self(-32603);
	/// A request was sent before the server finished initialization.
	pub const SERVER_NOT_INITIALIZED: Self = Self(-32002);
	/// Reserved code for errors the server cannot classify.
	pub const UNKNOWN_ERROR_CODE: Self = Self(-32001);
	/// The server detected the request failed without a more specific code.
	pub const REQUEST_FAILED: Self = Self(-32803);
	/// The server cancelled the request.
	pub const SERVER_CANCELLED: Self = Self(-32802);
	/// The content a request relates to changed while it was in flight.
	pub const CONTENT_MODIFIED: Self = Self(-32801);
	/// The client cancelled the request.
	pub const REQUEST_CANCELLED: Self = Self(-32800);
}

impl From<i32> for ErrorCode {
	fn from(code: i32) -> Self {
		Self(code)
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}
