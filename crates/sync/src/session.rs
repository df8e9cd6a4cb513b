//! Session identity tracking.
//!
//! The surrounding UI layer may rebuild its identity object on every render
//! without a real session change, so transitions are detected by **value**
//! comparison. A naive reference check would re-run the merge protocol
//! spuriously and double-merge the cart.
//!
//! There are no broadcast events: [`SessionTracker::apply`] returns the
//! transition exactly once per change and the session layer hands it
//! directly to the engines' resync functions (see [`crate::state`]).

use serde::{Deserialize, Serialize};

use hadiya_core::CustomerId;

/// Who is currently using the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// No credential present; the cart lives in the device-local stash.
    Anonymous,
    /// A signed-in customer; the server record is authoritative.
    Customer(CustomerId),
}

impl Identity {
    /// Whether a customer is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Customer(_))
    }

    /// The signed-in customer, if any.
    #[must_use]
    pub const fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Customer(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

/// A change of active identity, raised exactly once per change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityTransition {
    pub previous: Identity,
    pub next: Identity,
}

/// Tracks the active identity and dedups repeated applications.
#[derive(Debug)]
pub struct SessionTracker {
    current: Identity,
}

impl SessionTracker {
    /// Start anonymous (no stored credential at application start).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Identity::Anonymous,
        }
    }

    /// Start from an identity restored from stored credentials.
    #[must_use]
    pub const fn with_identity(identity: Identity) -> Self {
        Self { current: identity }
    }

    /// The currently active identity.
    #[must_use]
    pub const fn current(&self) -> Identity {
        self.current
    }

    /// Apply the identity reported by the auth layer.
    ///
    /// Returns `Some` transition only when the identity differs by value
    /// from the current one; re-applying an equal identity returns `None`
    /// so duplicate events cannot double-fire a resync.
    pub fn apply(&mut self, next: Identity) -> Option<IdentityTransition> {
        if self.current == next {
            return None;
        }
        let transition = IdentityTransition {
            previous: self.current,
            next,
        };
        self.current = next;
        Some(transition)
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
