//! In-memory token store and the credential verifier contract.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use hearth_types::Identity;

use crate::error::{AuthError, Result};
use crate::token::{hash_token_secret, verify_token_secret, TokenValue};

/// Maps an opaque credential string to a verified identity.
///
/// This is the contract the realtime layer consumes: it never sees
/// token internals, only `credential in, identity or invalid out`.
pub trait CredentialVerifier: Send + Sync {
    /// Verify a credential, returning the bound identity on success.
    fn verify(&self, credential: &str) -> Result<Identity>;
}

/// A token record kept by the store. Only the secret's hash is retained.
#[derive(Debug, Clone)]
struct IssuedToken {
    token_hash: String,
    identity: Identity,
    expires_at: Option<u64>,
}

/// In-memory store of issued access tokens, indexed by token prefix.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl TokenStore {
    /// Creates a new empty token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token bound to `identity`.
    ///
    /// Returns the plaintext token (only shown once).
    pub fn issue(&self, identity: Identity, expires_at: Option<u64>) -> Result<String> {
        let value = TokenValue::generate();
        let token_hash = hash_token_secret(&value.secret)?;

        let record = IssuedToken {
            token_hash,
            identity,
            expires_at,
        };

        self.tokens.write().insert(value.prefix.clone(), record);
        Ok(value.to_string())
    }

    /// Revoke a token by its plaintext value.
    ///
    /// Returns true if a token was removed.
    pub fn revoke(&self, credential: &str) -> bool {
        match TokenValue::parse(credential) {
            Ok(value) => self.tokens.write().remove(&value.prefix).is_some(),
            Err(_) => false,
        }
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Whether the store holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

impl CredentialVerifier for TokenStore {
    fn verify(&self, credential: &str) -> Result<Identity> {
        let value = TokenValue::parse(credential)?;

        let record = self
            .tokens
            .read()
            .get(&value.prefix)
            .cloned()
            .ok_or(AuthError::InvalidCredential)?;

        if let Some(expires_at) = record.expires_at {
            if unix_now() >= expires_at {
                return Err(AuthError::CredentialExpired);
            }
        }

        verify_token_secret(&value.secret, &record.token_hash)?;

        Ok(record.identity)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let store = TokenStore::new();
        let token = store.issue(Identity::new("alice", "H1"), None).unwrap();

        let identity = store.verify(&token).unwrap();
        assert_eq!(identity.user_id.as_str(), "alice");
        assert_eq!(identity.household_id.as_str(), "H1");
    }

    #[test]
    fn test_verify_unknown_token() {
        let store = TokenStore::new();
        store.issue(Identity::new("alice", "H1"), None).unwrap();

        let other = TokenValue::generate().to_string();
        assert!(matches!(
            store.verify(&other),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let store = TokenStore::new();
        let token = store.issue(Identity::new("alice", "H1"), None).unwrap();

        // Same prefix, different secret
        let value = TokenValue::parse(&token).unwrap();
        let forged = format!("hearth_{}_{}", value.prefix, "A".repeat(32));
        assert!(store.verify(&forged).is_err());
    }

    #[test]
    fn test_verify_malformed() {
        let store = TokenStore::new();
        assert!(matches!(
            store.verify("not-a-token"),
            Err(AuthError::InvalidTokenFormat)
        ));
    }

    #[test]
    fn test_verify_expired() {
        let store = TokenStore::new();
        let token = store
            .issue(Identity::new("alice", "H1"), Some(unix_now() - 1))
            .unwrap();

        assert!(matches!(
            store.verify(&token),
            Err(AuthError::CredentialExpired)
        ));
    }

    #[test]
    fn test_revoke() {
        let store = TokenStore::new();
        let token = store.issue(Identity::new("alice", "H1"), None).unwrap();

        assert!(store.revoke(&token));
        assert!(store.verify(&token).is_err());
        assert!(!store.revoke(&token));
        assert!(store.is_empty());
    }
}
