//! Session identity and authentication lifecycle events.
//!
//! There is no ambient "current user": the identity is an explicit value that
//! callers thread into every ledger and store operation, and the lifecycle
//! `anonymous -> authenticated -> anonymous` is driven by [AuthEvent]s from
//! the identity provider.

use serde::{Deserialize, Serialize};

/// Alias for the integer type used for user IDs.
pub type UserId = i64;

/// The principal a ledger operation runs as.
///
/// The persistence store scopes every record to an identity, so a session can
/// only ever read and write its own records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionIdentity {
    /// No one is signed in. Records created in this state are scoped to the
    /// shared anonymous identity.
    Anonymous,
    /// A signed-in user.
    User(UserId),
}

impl SessionIdentity {
    /// The user ID, or `None` for the anonymous identity.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            SessionIdentity::Anonymous => None,
            SessionIdentity::User(user_id) => Some(*user_id),
        }
    }

    /// Whether no one is signed in.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, SessionIdentity::Anonymous)
    }
}

/// A change in who is signed in, as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in. The caller should reload the ledger for the new
    /// identity.
    SignedIn(UserId),
    /// The user signed out. The ledger resets its collection to empty.
    SignedOut,
}

#[cfg(test)]
mod tests {
    use super::SessionIdentity;

    #[test]
    fn anonymous_has_no_user_id() {
        assert_eq!(SessionIdentity::Anonymous.user_id(), None);
        assert!(SessionIdentity::Anonymous.is_anonymous());
    }

    #[test]
    fn user_identity_exposes_its_id() {
        assert_eq!(SessionIdentity::User(42).user_id(), Some(42));
        assert!(!SessionIdentity::User(42).is_anonymous());
    }
}
