//! API key bindings.
//!
//! Every operation starts here: a presented key must be bound before any
//! entity is read or written.

use crate::error::MarketError;
use crate::types::{ApiKey, UserId};
use std::collections::HashMap;

/// Key → user binding, one active key per user
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    keys: HashMap<ApiKey, UserId>,
    active: HashMap<UserId, ApiKey>,
}

impl AuthGate {
    /// Creates a gate with no bindings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently bound to a user
    #[must_use]
    pub fn validate(&self, key: &ApiKey) -> bool {
        self.keys.contains_key(key)
    }

    /// The user `key` is bound to
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Unauthorized`] for any key that is not bound.
    pub fn resolve_owner(&self, key: &ApiKey) -> Result<&UserId, MarketError> {
        self.keys.get(key).ok_or(MarketError::Unauthorized)
    }

    /// Whether `key` is already in use
    #[must_use]
    pub fn is_bound(&self, key: &str) -> bool {
        self.keys.contains_key(&ApiKey::new(key))
    }

    /// Binds `key` to `user`, unbinding the user's previous key
    ///
    /// Returns the key that stopped working, if any.
    pub fn bind(&mut self, user: UserId, key: ApiKey) -> Option<ApiKey> {
        let previous = self.active.insert(user.clone(), key.clone());
        if let Some(old) = &previous {
            self.keys.remove(old);
        }
        self.keys.insert(key, user);
        previous
    }

    /// Number of bound keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unbound_key_is_unauthorized() {
        let gate = AuthGate::new();
        let key = ApiKey::new("guess");
        assert!(!gate.validate(&key));
        assert_eq!(gate.resolve_owner(&key), Err(MarketError::Unauthorized));
    }

    #[test]
    fn bound_key_resolves_to_user() {
        let mut gate = AuthGate::new();
        gate.bind(UserId::new("alice"), ApiKey::new("k1"));

        assert!(gate.validate(&ApiKey::new("k1")));
        assert_eq!(gate.resolve_owner(&ApiKey::new("k1")).unwrap(), &UserId::new("alice"));
    }

    #[test]
    fn rebinding_unbinds_previous_key() {
        let mut gate = AuthGate::new();
        gate.bind(UserId::new("alice"), ApiKey::new("k1"));
        let previous = gate.bind(UserId::new("alice"), ApiKey::new("k2"));

        assert_eq!(previous, Some(ApiKey::new("k1")));
        assert!(!gate.validate(&ApiKey::new("k1")));
        assert!(gate.validate(&ApiKey::new("k2")));
        assert_eq!(gate.len(), 1);
    }
}
