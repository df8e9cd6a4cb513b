//! User feedback seam.
//!
//! The engines report operation outcomes here and never depend on what the
//! sink does with them. The storefront UI plugs in its toast layer; the
//! default sink just logs.

use std::sync::Arc;

/// Receives success/failure messages for user feedback.
///
/// Server-provided messages are passed through verbatim.
pub trait NotificationSink: Send + Sync {
    /// An operation completed; `message` is suitable for display.
    fn success(&self, message: &str);

    /// An operation failed; `message` is suitable for display.
    fn failure(&self, message: &str);
}

/// Default sink that forwards messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn success(&self, message: &str) {
        tracing::info!(message, "operation succeeded");
    }

    fn failure(&self, message: &str) {
        tracing::warn!(message, "operation failed");
    }
}

/// Shared sink handle used by the engines.
pub type SharedSink = Arc<dyn NotificationSink>;
