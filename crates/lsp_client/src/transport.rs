//! Seam between features and the connection driving a language server.

use async_trait::async_trait;

use crate::types::{AnyNotification, AnyRequest};
use crate::{JsonValue, Result};

/// Outbound channel to a running language server.
///
/// Features never touch wire framing; they hand fully formed envelopes to
/// this seam. Hosts implement it on their connection type, tests on stubs.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Enqueues a notification without waiting for delivery.
	fn notify(&self, notification: AnyNotification) -> Result<()>;

	/// Sends a request and waits for the server's result.
	///
	/// Dropping the returned future abandons the request; cancellation
	/// propagates downstream when the implementation supports it.
	async fn request(&self, request: AnyRequest) -> Result<JsonValue>;
}
